//! Middleware de autenticación JWT
//!
//! Extractor que valida el bearer token y expone al usuario autenticado en
//! los handlers.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::{
    models::auth::TokenType,
    services::jwt_service::JwtService,
    state::AppState,
    utils::errors::AppError,
};

/// Usuario autenticado que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Extrae el token del header `Authorization: Bearer <token>`
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Token de autorización requerido".to_string()))?;

        let claims = state.jwt.validate(token, TokenType::Access)?;
        let user_id = JwtService::user_id(&claims)?;

        Ok(AuthenticatedUser { user_id })
    }
}
