//! Modelo de User y perfiles
//!
//! Usuarios, perfiles de pasajero/conductor y vehículos. El password hash
//! nunca se serializa.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tipo de usuario
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Passenger,
    Driver,
    CarOwner,
    Admin,
    Support,
}

text_enum!(UserType, "unknown user type" {
    Passenger => "passenger",
    Driver => "driver",
    CarOwner => "car_owner",
    Admin => "admin",
    Support => "support",
});

/// User principal
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub user_type: UserType,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Datos para crear un usuario (password ya hasheado)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub user_type: UserType,
    pub password_hash: String,
}

/// Perfil de pasajero (1:1 con User)
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PassengerProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub home_address: String,
    pub work_address: String,
    pub favorite_locations: serde_json::Value,
    pub emergency_contact: String,
    pub rating: f64,
    pub total_rides: i32,
}

impl PassengerProfile {
    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            home_address: String::new(),
            work_address: String::new(),
            favorite_locations: serde_json::Value::Array(Vec::new()),
            emergency_contact: String::new(),
            rating: 5.0,
            total_rides: 0,
        }
    }
}

/// Estado de verificación del conductor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DriverStatus {
    Pending,
    Approved,
    Rejected,
    Suspended,
}

text_enum!(DriverStatus, "unknown driver status" {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Suspended => "suspended",
});

/// Perfil de conductor (1:1 con User)
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DriverProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub license_number: String,
    pub license_expiry: NaiveDate,
    pub status: DriverStatus,
    pub is_online: bool,
    pub current_location: serde_json::Value,
    pub rating: f64,
    pub total_rides: i32,
    pub total_earnings: Decimal,
    pub bank_account: String,
}

impl DriverProfile {
    pub fn for_user(user_id: Uuid, license_number: String, license_expiry: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            license_number,
            license_expiry,
            status: DriverStatus::Pending,
            is_online: false,
            current_location: serde_json::Value::Object(serde_json::Map::new()),
            rating: 5.0,
            total_rides: 0,
            total_earnings: Decimal::ZERO,
            bank_account: String::new(),
        }
    }
}

/// Categoría del vehículo
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    Economy,
    Comfort,
    Premium,
}

text_enum!(VehicleType, "unknown vehicle type" {
    Economy => "economy",
    Comfort => "comfort",
    Premium => "premium",
});

/// Vehículo de un conductor
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Vehicle {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub license_plate: String,
    pub color: String,
    pub seats: i32,
    pub vehicle_type: VehicleType,
    pub registration_number: String,
    pub insurance_expiry: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_type_parsing() {
        assert_eq!("car_owner".parse::<UserType>(), Ok(UserType::CarOwner));
        assert_eq!(UserType::Driver.to_string(), "driver");
        assert!("rider".parse::<UserType>().is_err());
    }

    #[test]
    fn test_new_driver_profile_defaults() {
        let expiry = NaiveDate::from_ymd_opt(2030, 1, 1).expect("valid date");
        let profile = DriverProfile::for_user(Uuid::new_v4(), "LIC-1".to_string(), expiry);
        assert_eq!(profile.status, DriverStatus::Pending);
        assert!(!profile.is_online);
        assert_eq!(profile.rating, 5.0);
    }
}
