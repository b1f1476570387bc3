//! Middleware del sistema
//!
//! Este módulo contiene la autenticación por bearer token y CORS.

pub mod auth;
pub mod cors;

pub use auth::AuthenticatedUser;
pub use cors::*;
