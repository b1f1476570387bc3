//! DTOs de la API
//!
//! Requests validados con `validator` y responses que no son modelos directos.

pub mod common_dto;
pub mod payment_dto;
pub mod ride_dto;
pub mod user_dto;

pub use common_dto::{optional_json, ApiResponse};
