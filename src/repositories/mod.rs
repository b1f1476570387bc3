//! Repositorios
//!
//! Puertos de persistencia (traits) y sus implementaciones PostgreSQL y en
//! memoria. Los controllers solo ven los traits.

pub mod identity_repository;
pub mod memory;
pub mod payment_repository;
pub mod ride_repository;

pub use identity_repository::{IdentityStore, PgIdentityStore, ProfileDraft};
pub use memory::InMemoryStore;
pub use payment_repository::{PaymentLedger, PgPaymentLedger, SettlementRequest};
pub use ride_repository::{PgRideRepository, RideRepository};
