use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::utils::errors::{AppError, AppResult};

// Response genérica para operaciones que modifican estado
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

/// Body JSON opcional. Solo un body vacío equivale a `T::default()`;
/// cualquier otro contenido tiene que deserializar o la request falla.
pub fn optional_json<T: DeserializeOwned + Default>(body: &[u8]) -> AppResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::ride_dto::CompleteRideRequest;

    #[test]
    fn test_optional_json_empty_body_is_default() {
        let request: CompleteRideRequest = optional_json(b"").unwrap();
        assert!(request.actual_fare.is_none());
        let request: CompleteRideRequest = optional_json(b"  \n").unwrap();
        assert!(request.actual_fare.is_none());
    }

    #[test]
    fn test_optional_json_rejects_malformed_body() {
        let wrong_type = optional_json::<CompleteRideRequest>(br#"{"actual_fare": "fifteen"}"#);
        assert!(matches!(wrong_type, Err(AppError::BadRequest(_))));
        let broken = optional_json::<CompleteRideRequest>(b"{");
        assert!(matches!(broken, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_optional_json_parses_body() {
        let request: CompleteRideRequest = optional_json(br#"{"actual_fare": "15.00"}"#).unwrap();
        assert_eq!(request.actual_fare, Some(rust_decimal::Decimal::new(1500, 2)));
    }
}
