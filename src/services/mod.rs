//! Services module
//!
//! Este módulo contiene los servicios de autenticación: emisión y
//! validación de tokens JWT, y registro/login de usuarios.

pub mod auth_service;
pub mod jwt_service;

pub use auth_service::AuthService;
pub use jwt_service::{JwtConfig, JwtService};
