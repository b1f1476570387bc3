use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::user_dto::CreateVehicleRequest;
use crate::models::user::{DriverProfile, PassengerProfile, User, Vehicle};
use crate::repositories::IdentityStore;
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::validation::normalize_license_plate;

pub struct UserController {
    identities: Arc<dyn IdentityStore>,
}

fn driver_not_found() -> AppError {
    AppError::NotFound("Driver profile not found".to_string())
}

impl UserController {
    pub fn new(state: &AppState) -> Self {
        Self {
            identities: state.identities.clone(),
        }
    }

    pub async fn me(&self, user_id: Uuid) -> AppResult<User> {
        self.identities
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| not_found_error("User", &user_id.to_string()))
    }

    pub async fn passenger_profile(&self, user_id: Uuid) -> AppResult<PassengerProfile> {
        self.identities
            .find_passenger_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Passenger profile not found".to_string()))
    }

    pub async fn driver_profile(&self, user_id: Uuid) -> AppResult<DriverProfile> {
        self.identities
            .find_driver_by_user(user_id)
            .await?
            .ok_or_else(driver_not_found)
    }

    /// Cambia la disponibilidad del conductor
    pub async fn set_online(&self, user_id: Uuid, online: bool) -> AppResult<DriverProfile> {
        let driver = self
            .identities
            .set_driver_online(user_id, online)
            .await?
            .ok_or_else(driver_not_found)?;

        tracing::info!(
            "{} Conductor {} {}",
            if online { "🟢" } else { "⚪" },
            driver.id,
            if online { "online" } else { "offline" }
        );
        Ok(driver)
    }

    pub async fn add_vehicle(&self, user_id: Uuid, request: CreateVehicleRequest) -> AppResult<Vehicle> {
        request.validate()?;
        let driver = self.driver_profile(user_id).await?;

        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            driver_id: driver.id,
            make: request.make,
            model: request.model,
            year: request.year,
            license_plate: normalize_license_plate(&request.license_plate),
            color: request.color,
            seats: request.seats,
            vehicle_type: request.vehicle_type,
            registration_number: request.registration_number,
            insurance_expiry: request.insurance_expiry,
            is_active: true,
            created_at: Utc::now(),
        };

        self.identities.add_vehicle(&vehicle).await
    }

    pub async fn list_vehicles(&self, user_id: Uuid) -> AppResult<Vec<Vehicle>> {
        let driver = self.driver_profile(user_id).await?;
        self.identities.list_vehicles(driver.id).await
    }
}
