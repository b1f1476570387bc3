//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::ride::RideStatus;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {message}")]
    InvalidTransition {
        message: String,
        current: Option<RideStatus>,
    },

    #[error("Uniqueness violation: {0}")]
    UniquenessViolation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Hash error: {0}")]
    Hash(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl ErrorResponse {
    fn new(error: &str, message: String, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message,
            details: None,
            code: Some(code.to_string()),
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl AppError {
    /// Código HTTP asociado a cada variante
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Hash(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Validation(_) | AppError::InvalidTransition { .. } | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UniquenessViolation(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("❌ {}", self);
        } else {
            tracing::warn!("⚠️ {}", self);
        }

        let error_response = match self {
            AppError::Database(e) => ErrorResponse::new(
                "Database Error",
                "An error occurred while accessing the database".to_string(),
                "DB_ERROR",
            )
            .with_details(json!({ "sql_error": e.to_string() })),

            AppError::Validation(e) => ErrorResponse::new(
                "Validation Error",
                "The provided data is invalid".to_string(),
                "VALIDATION_ERROR",
            )
            .with_details(json!(e)),

            AppError::NotFound(msg) => ErrorResponse::new("Not Found", msg, "NOT_FOUND"),

            AppError::InvalidTransition { message, current } => {
                let response = ErrorResponse::new("Invalid Transition", message, "INVALID_TRANSITION");
                match current {
                    Some(status) => response.with_details(json!({ "current_status": status })),
                    None => response,
                }
            }

            AppError::UniquenessViolation(msg) => {
                ErrorResponse::new("Uniqueness Violation", msg, "UNIQUENESS_VIOLATION")
            }

            AppError::Unauthorized(msg) => ErrorResponse::new("Unauthorized", msg, "UNAUTHORIZED"),

            AppError::BadRequest(msg) => ErrorResponse::new("Bad Request", msg, "BAD_REQUEST"),

            AppError::Jwt(msg) => ErrorResponse::new("JWT Error", msg, "JWT_ERROR"),

            AppError::Hash(msg) => ErrorResponse::new(
                "Hash Error",
                "An error occurred while processing credentials".to_string(),
                "HASH_ERROR",
            )
            .with_details(json!({ "hash_error": msg })),

            AppError::Internal(msg) => ErrorResponse::new(
                "Internal Server Error",
                "An unexpected error occurred".to_string(),
                "INTERNAL_ERROR",
            )
            .with_details(json!({ "internal_error": msg })),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Convierte un `ValidationError` suelto en un error de la aplicación
pub fn field_error(field: &'static str, error: validator::ValidationError) -> AppError {
    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);
    AppError::Validation(errors)
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de unicidad
pub fn uniqueness_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::UniquenessViolation(format!("{} with {} '{}' already exists", resource, field, value))
}

/// Función helper para crear errores de transición inválida
pub fn invalid_transition_error(operation: &str, current: Option<RideStatus>) -> AppError {
    let message = match current {
        Some(status) => format!("Ride cannot be {}: current status is '{}'", operation, status),
        None => format!("Ride cannot be {}", operation),
    };
    AppError::InvalidTransition { message, current }
}

/// Indica si un error de sqlx es una violación de restricción UNIQUE
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(
            AppError::NotFound("ride".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            invalid_transition_error("started", Some(RideStatus::Requested)).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            field_error("rating", validator::ValidationError::new("range")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::BadRequest("bad json".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::UniquenessViolation("rating".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Jwt("expired".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_transition_message_names_current_status() {
        let error = invalid_transition_error("cancelled", Some(RideStatus::Completed));
        assert!(error.to_string().contains("completed"));
    }

    #[test]
    fn test_into_response_uses_status_code() {
        let response = uniqueness_error("Rating", "rater", "abc").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
