//! Configuración del proyecto
//!
//! Variables de entorno del servicio (puerto, JWT, CORS, bcrypt, backend de
//! almacenamiento) y configuración del pool de base de datos.

pub mod database;
pub mod environment;

pub use database::DatabaseConfig;
pub use environment::*;
