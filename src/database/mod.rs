//! Módulo de base de datos
//!
//! Pool de PostgreSQL y migraciones embebidas (`migrations/`).

pub mod connection;

pub use connection::{mask_database_url, DatabaseConnection};
