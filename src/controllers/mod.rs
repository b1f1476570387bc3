//! Controllers
//!
//! Lógica de negocio de cada recurso. Se construyen por request a partir del
//! `AppState` y solo dependen de los traits de repositorio.

pub mod payment_controller;
pub mod ride_controller;
pub mod user_controller;

pub use payment_controller::PaymentController;
pub use ride_controller::RideController;
pub use user_controller::UserController;
