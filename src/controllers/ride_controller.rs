//! Ride Lifecycle Controller
//!
//! Aplica la máquina de estados del viaje. Cada cambio de estado es un
//! compare-and-set en el repositorio; si falla, se relee el viaje para
//! distinguir entre "no existe" y "estado incorrecto".

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::dto::ride_dto::{RateRideRequest, RequestRideRequest, RideDetailResponse};
use crate::models::ride::{
    Location, NewRide, Rating, Ride, RideEstimate, RideLocation, RideStatus, RideTransition,
};
use crate::repositories::{IdentityStore, RideRepository};
use crate::state::AppState;
use crate::utils::errors::{field_error, invalid_transition_error, not_found_error, AppError, AppResult};
use crate::utils::validation::{validate_coordinates, validate_money, validate_rating_score};

pub struct RideController {
    rides: Arc<dyn RideRepository>,
    identities: Arc<dyn IdentityStore>,
}

impl RideController {
    pub fn new(state: &AppState) -> Self {
        Self {
            rides: state.rides.clone(),
            identities: state.identities.clone(),
        }
    }

    async fn find_ride(&self, ride_id: Uuid) -> AppResult<Ride> {
        self.rides
            .find_by_id(ride_id)
            .await?
            .ok_or_else(|| not_found_error("Ride", &ride_id.to_string()))
    }

    /// Ejecuta la transición y traduce un compare-and-set fallido
    async fn transition(&self, ride_id: Uuid, transition: RideTransition) -> AppResult<Ride> {
        if let Some(ride) = self.rides.transition(ride_id, &transition).await? {
            tracing::info!("🚕 Ride {} → {}", ride.id, ride.status);
            return Ok(ride);
        }

        let current = self.find_ride(ride_id).await?;
        Err(invalid_transition_error(transition.verb(), Some(current.status)))
    }

    /// Solicita un viaje nuevo en nombre del pasajero autenticado
    pub async fn request_ride(&self, user_id: Uuid, request: RequestRideRequest) -> AppResult<Ride> {
        request.validate()?;

        let passenger = self
            .identities
            .find_passenger_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Passenger profile not found".to_string()))?;

        let pickup = Location::from(request.pickup_location);
        let dropoff = Location::from(request.dropoff_location);
        validate_coordinates(pickup.lat, pickup.lng).map_err(|e| field_error("pickup_location", e))?;
        validate_coordinates(dropoff.lat, dropoff.lng).map_err(|e| field_error("dropoff_location", e))?;
        validate_money(request.estimated_fare).map_err(|e| field_error("estimated_fare", e))?;

        let ride = Ride::requested(
            NewRide {
                passenger_id: passenger.id,
                pickup_location: pickup,
                dropoff_location: dropoff,
                estimate: RideEstimate {
                    distance_km: request.estimated_distance,
                    duration_minutes: request.estimated_duration,
                    fare: request.estimated_fare,
                },
                scheduled_time: request.scheduled_time,
            },
            Utc::now(),
        );

        let ride = self.rides.create(&ride).await?;
        tracing::info!("🆕 Ride {} solicitado por pasajero {}", ride.id, passenger.id);
        Ok(ride)
    }

    /// El conductor autenticado acepta un viaje en estado `requested`
    pub async fn accept_ride(&self, user_id: Uuid, ride_id: Uuid) -> AppResult<Ride> {
        self.find_ride(ride_id).await?;

        let driver = self
            .identities
            .find_driver_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Driver profile not found".to_string()))?;

        let vehicle_id = self
            .identities
            .list_vehicles(driver.id)
            .await?
            .into_iter()
            .find(|vehicle| vehicle.is_active)
            .map(|vehicle| vehicle.id);

        self.transition(
            ride_id,
            RideTransition::Accept {
                driver_id: driver.id,
                vehicle_id,
                at: Utc::now(),
            },
        )
        .await
    }

    pub async fn start_ride(&self, ride_id: Uuid) -> AppResult<Ride> {
        self.transition(ride_id, RideTransition::Start { at: Utc::now() }).await
    }

    /// Sin tarifa real se usa la estimada
    pub async fn complete_ride(&self, ride_id: Uuid, actual_fare: Option<Decimal>) -> AppResult<Ride> {
        if let Some(fare) = actual_fare {
            validate_money(fare).map_err(|e| field_error("actual_fare", e))?;
        }

        self.transition(ride_id, RideTransition::Complete { at: Utc::now(), actual_fare })
            .await
    }

    pub async fn cancel_ride(&self, ride_id: Uuid, reason: Option<String>) -> AppResult<Ride> {
        self.transition(
            ride_id,
            RideTransition::Cancel {
                at: Utc::now(),
                reason: reason.unwrap_or_default(),
            },
        )
        .await
    }

    /// Añade un breadcrumb; no hay restricción de estado
    pub async fn record_location(&self, ride_id: Uuid, latitude: f64, longitude: f64) -> AppResult<RideLocation> {
        validate_coordinates(latitude, longitude).map_err(|e| field_error("coordinates", e))?;
        self.find_ride(ride_id).await?;

        let location = RideLocation {
            id: Uuid::new_v4(),
            ride_id,
            latitude,
            longitude,
            timestamp: Utc::now(),
        };

        self.rides.add_location(&location).await
    }

    /// Califica el viaje. El calificado es el conductor si lo hay; si no, el pasajero.
    pub async fn rate_ride(&self, rater_id: Uuid, request: RateRideRequest) -> AppResult<Rating> {
        request.validate()?;
        let ride = self.find_ride(request.ride_id).await?;
        validate_rating_score(request.rating).map_err(|e| field_error("rating", e))?;

        let ratee_id = match ride.driver_id {
            Some(driver_id) => self
                .identities
                .find_driver_by_id(driver_id)
                .await?
                .map(|driver| driver.user_id)
                .ok_or_else(|| not_found_error("Driver", &driver_id.to_string()))?,
            None => self
                .identities
                .find_passenger_by_id(ride.passenger_id)
                .await?
                .map(|passenger| passenger.user_id)
                .ok_or_else(|| not_found_error("Passenger", &ride.passenger_id.to_string()))?,
        };

        let rating = Rating {
            id: Uuid::new_v4(),
            ride_id: ride.id,
            rater_id,
            ratee_id,
            rating: request.rating,
            comment: request.comment.unwrap_or_default(),
            created_at: Utc::now(),
        };

        let rating = self.rides.create_rating(&rating).await?;
        tracing::info!("⭐ Ride {} calificado con {}", ride.id, rating.rating);
        Ok(rating)
    }

    pub async fn get_ride(&self, ride_id: Uuid) -> AppResult<RideDetailResponse> {
        let ride = self.find_ride(ride_id).await?;
        let locations = self.rides.list_locations(ride_id).await?;
        Ok(RideDetailResponse { ride, locations })
    }

    /// Viajes del usuario como pasajero o, si no lo es, como conductor
    pub async fn list_rides(&self, user_id: Uuid, status: Option<&str>) -> AppResult<Vec<Ride>> {
        let status = match status {
            Some(raw) => Some(raw.parse::<RideStatus>().map_err(|e| {
                let mut error = ValidationError::new("status");
                error.message = Some(e.to_string().into());
                field_error("status", error)
            })?),
            None => None,
        };

        if let Some(passenger) = self.identities.find_passenger_by_user(user_id).await? {
            return self.rides.list_for_passenger(passenger.id, status).await;
        }
        if let Some(driver) = self.identities.find_driver_by_user(user_id).await? {
            return self.rides.list_for_driver(driver.id, status).await;
        }
        Ok(Vec::new())
    }

    pub async fn list_locations(&self, ride_id: Uuid) -> AppResult<Vec<RideLocation>> {
        self.find_ride(ride_id).await?;
        self.rides.list_locations(ride_id).await
    }

    pub async fn list_ratings(&self, ride_id: Uuid) -> AppResult<Vec<Rating>> {
        self.find_ride(ride_id).await?;
        self.rides.list_ratings(ride_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::environment::EnvironmentConfig;
    use crate::dto::ride_dto::LocationRequest;
    use crate::models::user::{NewUser, UserType};
    use crate::repositories::ProfileDraft;
    use chrono::NaiveDate;

    struct Fixture {
        controller: RideController,
        passenger_user: Uuid,
        driver_user: Uuid,
    }

    async fn user(state: &AppState, username: &str, phone: &str, profile: ProfileDraft) -> Uuid {
        let user_type = match profile {
            ProfileDraft::Driver { .. } => UserType::Driver,
            _ => UserType::Passenger,
        };
        state
            .identities
            .create_user(
                NewUser {
                    username: username.to_string(),
                    email: format!("{}@example.com", username),
                    first_name: String::new(),
                    last_name: String::new(),
                    phone_number: phone.to_string(),
                    user_type,
                    password_hash: String::new(),
                },
                profile,
            )
            .await
            .unwrap()
            .id
    }

    async fn fixture() -> Fixture {
        let state = AppState::in_memory(EnvironmentConfig::default());
        let passenger_user = user(&state, "p1", "1000000001", ProfileDraft::Passenger).await;
        let driver_user = user(
            &state,
            "d1",
            "1000000002",
            ProfileDraft::Driver {
                license_number: "LIC-D1".to_string(),
                license_expiry: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            },
        )
        .await;

        Fixture {
            controller: RideController::new(&state),
            passenger_user,
            driver_user,
        }
    }

    fn request(lat: f64) -> RequestRideRequest {
        RequestRideRequest {
            pickup_location: LocationRequest { lat, lng: 0.0, address: "A".to_string() },
            dropoff_location: LocationRequest { lat: 1.0, lng: 1.0, address: "B".to_string() },
            estimated_distance: 5.0,
            estimated_duration: 10,
            estimated_fare: Decimal::new(1200, 2),
            scheduled_time: None,
        }
    }

    #[tokio::test]
    async fn test_request_ride_requires_passenger_profile() {
        let f = fixture().await;
        let result = f.controller.request_ride(f.driver_user, request(0.0)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_request_ride_rejects_bad_coordinates() {
        let f = fixture().await;
        let result = f.controller.request_ride(f.passenger_user, request(95.0)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_accept_twice_is_invalid_and_keeps_first_driver() {
        let f = fixture().await;
        let ride = f.controller.request_ride(f.passenger_user, request(0.0)).await.unwrap();

        let accepted = f.controller.accept_ride(f.driver_user, ride.id).await.unwrap();
        let again = f.controller.accept_ride(f.driver_user, ride.id).await;

        assert!(matches!(
            again,
            Err(AppError::InvalidTransition { current: Some(RideStatus::Accepted), .. })
        ));
        let stored = f.controller.get_ride(ride.id).await.unwrap().ride;
        assert_eq!(stored, accepted);
    }

    #[tokio::test]
    async fn test_start_unknown_ride_is_not_found() {
        let f = fixture().await;
        let result = f.controller.start_ride(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_negative_actual_fare_is_rejected() {
        let f = fixture().await;
        let ride = f.controller.request_ride(f.passenger_user, request(0.0)).await.unwrap();
        let result = f.controller.complete_ride(ride.id, Some(Decimal::new(-1, 0))).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_rating_before_acceptance_targets_passenger() {
        let f = fixture().await;
        let ride = f.controller.request_ride(f.passenger_user, request(0.0)).await.unwrap();

        let rating = f
            .controller
            .rate_ride(
                f.driver_user,
                RateRideRequest { ride_id: ride.id, rating: 4, comment: None },
            )
            .await
            .unwrap();

        assert_eq!(rating.ratee_id, f.passenger_user);
        assert_eq!(rating.comment, "");
    }

    #[tokio::test]
    async fn test_list_rides_rejects_unknown_status() {
        let f = fixture().await;
        let result = f.controller.list_rides(f.passenger_user, Some("flying")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_rides_filters_by_status() {
        let f = fixture().await;
        let first = f.controller.request_ride(f.passenger_user, request(0.0)).await.unwrap();
        f.controller.request_ride(f.passenger_user, request(0.5)).await.unwrap();
        f.controller.cancel_ride(first.id, Some("changed plans".to_string())).await.unwrap();

        let cancelled = f.controller.list_rides(f.passenger_user, Some("cancelled")).await.unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].cancellation_reason, "changed plans");

        let all = f.controller.list_rides(f.passenger_user, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].created_at >= all[1].created_at);
    }
}
