//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.
//! Los valores por defecto sirven para desarrollo; en producción `JWT_SECRET`
//! es obligatorio.

use std::env;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Backend de persistencia
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    /// Segundos de vida del access token
    pub jwt_expiration: u64,
    /// Segundos de vida del refresh token
    pub jwt_refresh_expiration: u64,
    pub cors_origins: Vec<String>,
    pub bcrypt_cost: u32,
    pub storage: StorageBackend,
    pub run_migrations: bool,
}

const DEV_JWT_SECRET: &str = "development-only-jwt-secret";

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 8000,
            host: "0.0.0.0".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expiration: 3600,
            jwt_refresh_expiration: 7 * 24 * 3600,
            cors_origins: Vec::new(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            storage: StorageBackend::Postgres,
            run_migrations: true,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("{} must be valid, got '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

impl EnvironmentConfig {
    /// Lee la configuración desde las variables de entorno
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);
        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.trim().is_empty());
        let secret_is_set = jwt_secret.is_some();

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let bcrypt_cost = parse_var("BCRYPT_COST", defaults.bcrypt_cost)?;
        if !(4..=31).contains(&bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31, got {}", bcrypt_cost);
        }

        let config = Self {
            port: parse_var("PORT", defaults.port)?,
            host: env::var("HOST").unwrap_or(defaults.host),
            jwt_secret: jwt_secret.unwrap_or(defaults.jwt_secret),
            jwt_expiration: parse_var("JWT_EXPIRATION", defaults.jwt_expiration)?,
            jwt_refresh_expiration: parse_var("JWT_REFRESH_EXPIRATION", defaults.jwt_refresh_expiration)?,
            cors_origins,
            bcrypt_cost,
            storage: parse_var("STORAGE", defaults.storage)?,
            run_migrations: parse_var("RUN_MIGRATIONS", defaults.run_migrations)?,
            environment,
        };

        if config.is_production() && !secret_is_set {
            bail!("JWT_SECRET must be set in production");
        }
        Ok(config)
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
