use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::auth::TokenPair;
use crate::models::user::{User, UserType, VehicleType};
use crate::utils::validation::{validate_license_plate, validate_phone};

fn default_user_type() -> UserType {
    UserType::Passenger
}

// Request de registro
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 150))]
    pub username: String,
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(must_match = "password")]
    pub password_confirm: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[validate(custom = "validate_phone")]
    pub phone_number: String,
    #[serde(default = "default_user_type")]
    pub user_type: UserType,
    // Solo para conductores
    #[validate(length(min = 1, max = 50))]
    pub license_number: Option<String>,
    pub license_expiry: Option<NaiveDate>,
}

// Login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

// Refresh request
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh: String,
}

// Response de registro y login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct RefreshTokenResponse {
    pub access: String,
    pub access_expires_at: DateTime<Utc>,
}

fn default_seats() -> i32 {
    4
}

fn default_vehicle_type() -> VehicleType {
    VehicleType::Economy
}

// Request para registrar un vehículo
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 50))]
    pub make: String,
    #[validate(length(min = 1, max = 50))]
    pub model: String,
    #[validate(range(min = 1950, max = 2100))]
    pub year: i32,
    #[validate(custom = "validate_license_plate")]
    pub license_plate: String,
    #[validate(length(min = 1, max = 30))]
    pub color: String,
    #[serde(default = "default_seats")]
    #[validate(range(min = 1, max = 9))]
    pub seats: i32,
    #[serde(default = "default_vehicle_type")]
    pub vehicle_type: VehicleType,
    #[validate(length(min = 1, max = 50))]
    pub registration_number: String,
    pub insurance_expiry: NaiveDate,
}
