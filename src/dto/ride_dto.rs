use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::ride::{Location, Ride, RideLocation};

// Punto de recogida o destino. Las coordenadas se validan en el controller.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LocationRequest {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub address: String,
}

impl From<LocationRequest> for Location {
    fn from(request: LocationRequest) -> Self {
        Self {
            lat: request.lat,
            lng: request.lng,
            address: request.address,
        }
    }
}

// Request para solicitar un viaje
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RequestRideRequest {
    #[validate]
    pub pickup_location: LocationRequest,
    #[validate]
    pub dropoff_location: LocationRequest,
    #[validate(range(min = 0.0))]
    pub estimated_distance: f64,
    #[validate(range(min = 0))]
    pub estimated_duration: i32,
    pub estimated_fare: Decimal,
    pub scheduled_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteRideRequest {
    pub actual_fare: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CancelRideRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

// Breadcrumb enviado por el conductor
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLocationRequest {
    pub ride_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RateRideRequest {
    pub ride_id: Uuid,
    pub rating: i32,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRidesQuery {
    pub status: Option<String>,
}

// Detalle de un viaje con sus breadcrumbs
#[derive(Debug, Serialize)]
pub struct RideDetailResponse {
    #[serde(flatten)]
    pub ride: Ride,
    pub locations: Vec<RideLocation>,
}
