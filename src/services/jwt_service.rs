use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::config::environment::EnvironmentConfig;
use crate::models::auth::{JwtClaims, TokenPair, TokenType};
use crate::models::user::User;
use crate::utils::errors::{AppError, AppResult};

/// Configuración JWT
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub access_token_duration: Duration,
    pub refresh_token_duration: Duration,
}

impl From<&EnvironmentConfig> for JwtConfig {
    fn from(config: &EnvironmentConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            algorithm: Algorithm::HS256,
            access_token_duration: Duration::seconds(config.jwt_expiration as i64),
            refresh_token_duration: Duration::seconds(config.jwt_refresh_expiration as i64),
        }
    }
}

/// Servicio JWT
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    fn sign(&self, user: &User, token_type: TokenType, lifetime: Duration) -> AppResult<(String, i64)> {
        let now = Utc::now();
        let exp = (now + lifetime).timestamp();

        let claims = JwtClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            user_type: user.user_type,
            token_type,
            exp,
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(self.config.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::Jwt(format!("Error generating token: {}", e)))?;
        Ok((token, exp))
    }

    /// Emite el par access/refresh para un usuario
    pub fn issue_token(&self, user: &User) -> AppResult<TokenPair> {
        let (access, access_exp) = self.sign(user, TokenType::Access, self.config.access_token_duration)?;
        let (refresh, _) = self.sign(user, TokenType::Refresh, self.config.refresh_token_duration)?;

        Ok(TokenPair {
            access,
            refresh,
            access_expires_at: chrono::DateTime::from_timestamp(access_exp, 0).unwrap_or_else(Utc::now),
        })
    }

    /// Valida y decodifica un token del tipo esperado
    pub fn validate(&self, token: &str, expected: TokenType) -> AppResult<JwtClaims> {
        let validation = Validation::new(self.config.algorithm);

        let claims = decode::<JwtClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Jwt(format!("Invalid token: {}", e)))?;

        if claims.token_type != expected {
            return Err(AppError::Jwt("Token type not allowed here".to_string()));
        }
        Ok(claims)
    }

    /// Extrae el user_id de unos claims ya validados
    pub fn user_id(claims: &JwtClaims) -> AppResult<Uuid> {
        Uuid::parse_str(&claims.sub).map_err(|_| AppError::Jwt("Invalid subject in token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserType;

    fn service() -> JwtService {
        JwtService::new(JwtConfig::from(&EnvironmentConfig::default()))
    }

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "test_user".to_string(),
            email: "test@example.com".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            phone_number: "1234567890".to_string(),
            user_type: UserType::Driver,
            password_hash: String::new(),
            is_verified: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_generate_and_validate_token() {
        let jwt_service = service();
        let user = user();

        let pair = jwt_service.issue_token(&user).unwrap();
        assert!(!pair.access.is_empty());
        assert!(pair.access_expires_at > Utc::now());

        let claims = jwt_service.validate(&pair.access, TokenType::Access).unwrap();
        assert_eq!(JwtService::user_id(&claims).unwrap(), user.id);
        assert_eq!(claims.username, "test_user");
        assert_eq!(claims.user_type, UserType::Driver);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let jwt_service = service();
        let pair = jwt_service.issue_token(&user()).unwrap();

        assert!(jwt_service.validate(&pair.refresh, TokenType::Access).is_err());
        assert!(jwt_service.validate(&pair.refresh, TokenType::Refresh).is_ok());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let mut config = EnvironmentConfig::default();
        config.jwt_secret = "another-secret".to_string();
        let other = JwtService::new(JwtConfig::from(&config));

        let pair = other.issue_token(&user()).unwrap();
        assert!(matches!(service().validate(&pair.access, TokenType::Access), Err(AppError::Jwt(_))));
    }
}
