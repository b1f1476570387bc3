use std::sync::Arc;

use validator::{Validate, ValidationError};

use crate::dto::user_dto::{
    AuthResponse, LoginRequest, RefreshTokenRequest, RefreshTokenResponse, RegisterRequest,
};
use crate::models::auth::TokenType;
use crate::models::user::{NewUser, UserType};
use crate::repositories::identity_repository::{IdentityStore, ProfileDraft};
use crate::services::jwt_service::JwtService;
use crate::utils::errors::{field_error, AppError, AppResult};

/// Servicio de autenticación
pub struct AuthService {
    identities: Arc<dyn IdentityStore>,
    jwt_service: Arc<JwtService>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(identities: Arc<dyn IdentityStore>, jwt_service: Arc<JwtService>, bcrypt_cost: u32) -> Self {
        Self {
            identities,
            jwt_service,
            bcrypt_cost,
        }
    }

    /// Registra un usuario y crea su perfil según el tipo
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let profile = match request.user_type {
            UserType::Passenger => ProfileDraft::Passenger,
            UserType::Driver => match (request.license_number.clone(), request.license_expiry) {
                (Some(license_number), Some(license_expiry)) => ProfileDraft::Driver {
                    license_number,
                    license_expiry,
                },
                _ => {
                    let mut error = ValidationError::new("required");
                    error.message = Some("Drivers must provide license_number and license_expiry".into());
                    return Err(field_error("license_number", error));
                }
            },
            _ => ProfileDraft::None,
        };

        let password_hash = self.hash_password(request.password).await?;

        let user = self
            .identities
            .create_user(
                NewUser {
                    username: request.username,
                    email: request.email,
                    first_name: request.first_name,
                    last_name: request.last_name,
                    phone_number: request.phone_number,
                    user_type: request.user_type,
                    password_hash,
                },
                profile,
            )
            .await?;

        let tokens = self.jwt_service.issue_token(&user)?;
        tracing::info!("✅ Usuario registrado: {} ({})", user.username, user.user_type);

        Ok(AuthResponse { user, tokens })
    }

    /// Autentica con username y password
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        request.validate()?;

        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let user = self
            .identities
            .find_user_by_username(&request.username)
            .await?
            .ok_or_else(invalid)?;

        let hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || bcrypt::verify(request.password, &hash))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .map_err(|e| AppError::Hash(e.to_string()))?;

        if !valid {
            tracing::warn!("🔒 Login fallido para {}", user.username);
            return Err(invalid());
        }

        let tokens = self.jwt_service.issue_token(&user)?;
        tracing::info!("🔑 Login correcto: {}", user.username);

        Ok(AuthResponse { user, tokens })
    }

    /// Emite un nuevo access token a partir de un refresh token
    pub async fn refresh(&self, request: RefreshTokenRequest) -> AppResult<RefreshTokenResponse> {
        let claims = self.jwt_service.validate(&request.refresh, TokenType::Refresh)?;
        let user_id = JwtService::user_id(&claims)?;

        let user = self
            .identities
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

        let tokens = self.jwt_service.issue_token(&user)?;
        Ok(RefreshTokenResponse {
            access: tokens.access,
            access_expires_at: tokens.access_expires_at,
        })
    }

    async fn hash_password(&self, password: String) -> AppResult<String> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .map_err(|e| AppError::Hash(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::environment::EnvironmentConfig;
    use crate::repositories::memory::InMemoryStore;
    use crate::services::jwt_service::JwtConfig;
    use chrono::NaiveDate;

    fn service() -> AuthService {
        let jwt = Arc::new(JwtService::new(JwtConfig::from(&EnvironmentConfig::default())));
        AuthService::new(Arc::new(InMemoryStore::new()), jwt, 4)
    }

    fn register_request(username: &str, user_type: UserType) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "s3cret-pass".to_string(),
            password_confirm: "s3cret-pass".to_string(),
            first_name: "Ana".to_string(),
            last_name: "García".to_string(),
            phone_number: "600123456".to_string() + &username.len().to_string(),
            user_type,
            license_number: None,
            license_expiry: None,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service();
        let registered = service.register(register_request("ana", UserType::Passenger)).await.unwrap();
        assert!(!registered.tokens.access.is_empty());

        let logged = service
            .login(LoginRequest {
                username: "ana".to_string(),
                password: "s3cret-pass".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(logged.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_is_unauthorized() {
        let service = service();
        service.register(register_request("ana", UserType::Passenger)).await.unwrap();

        let result = service
            .login(LoginRequest {
                username: "ana".to_string(),
                password: "wrong-pass".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_password_confirmation_must_match() {
        let mut request = register_request("ana", UserType::Passenger);
        request.password_confirm = "different".to_string();

        let result = service().register(request).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_driver_requires_license() {
        let service = service();
        let result = service.register(register_request("luis", UserType::Driver)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let mut request = register_request("luis", UserType::Driver);
        request.license_number = Some("LIC-123".to_string());
        request.license_expiry = NaiveDate::from_ymd_opt(2030, 12, 31);
        assert!(service.register(request).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_issues_new_access_token() {
        let service = service();
        let registered = service.register(register_request("ana", UserType::Passenger)).await.unwrap();

        let refreshed = service
            .refresh(RefreshTokenRequest { refresh: registered.tokens.refresh.clone() })
            .await
            .unwrap();
        assert!(!refreshed.access.is_empty());

        let with_access = service
            .refresh(RefreshTokenRequest { refresh: registered.tokens.access })
            .await;
        assert!(matches!(with_access, Err(AppError::Jwt(_))));
    }
}
