//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Los repositorios se inyectan como traits.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::{
    IdentityStore, InMemoryStore, PaymentLedger, PgIdentityStore, PgPaymentLedger,
    PgRideRepository, RideRepository,
};
use crate::services::jwt_service::{JwtConfig, JwtService};

#[derive(Clone)]
pub struct AppState {
    pub config: EnvironmentConfig,
    pub rides: Arc<dyn RideRepository>,
    pub identities: Arc<dyn IdentityStore>,
    pub ledger: Arc<dyn PaymentLedger>,
    pub jwt: Arc<JwtService>,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        rides: Arc<dyn RideRepository>,
        identities: Arc<dyn IdentityStore>,
        ledger: Arc<dyn PaymentLedger>,
    ) -> Self {
        let jwt = Arc::new(JwtService::new(JwtConfig::from(&config)));
        Self {
            config,
            rides,
            identities,
            ledger,
            jwt,
        }
    }

    /// Estado respaldado por PostgreSQL
    pub fn postgres(pool: PgPool, config: EnvironmentConfig) -> Self {
        Self::new(
            config,
            Arc::new(PgRideRepository::new(pool.clone())),
            Arc::new(PgIdentityStore::new(pool.clone())),
            Arc::new(PgPaymentLedger::new(pool)),
        )
    }

    /// Estado en memoria: un único store comparte las tres interfaces
    pub fn in_memory(config: EnvironmentConfig) -> Self {
        let store = InMemoryStore::new();
        Self::new(
            config,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
        )
    }
}
