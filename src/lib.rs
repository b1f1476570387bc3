//! Backend de ride-hailing
//!
//! Ciclo de vida de viajes (request → accept → start → complete/cancel),
//! breadcrumbs de ubicación, ratings y liquidación de pagos, expuestos como
//! API REST con axum.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_router;
pub use state::AppState;
pub use utils::errors::{AppError, AppResult};
