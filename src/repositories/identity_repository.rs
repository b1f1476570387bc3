//! Identity Store
//!
//! Usuarios, perfiles de pasajero/conductor y vehículos.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::user::{
    DriverProfile, NewUser, PassengerProfile, User, Vehicle,
};
use crate::utils::errors::{is_unique_violation, AppError, AppResult};

/// Perfil que se crea junto al usuario en el registro
#[derive(Debug, Clone)]
pub enum ProfileDraft {
    Passenger,
    Driver {
        license_number: String,
        license_expiry: NaiveDate,
    },
    None,
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Crea el usuario y su perfil en una sola unidad de trabajo
    async fn create_user(&self, new_user: NewUser, profile: ProfileDraft) -> AppResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_passenger_by_user(&self, user_id: Uuid) -> AppResult<Option<PassengerProfile>>;

    async fn find_driver_by_user(&self, user_id: Uuid) -> AppResult<Option<DriverProfile>>;

    async fn find_passenger_by_id(&self, id: Uuid) -> AppResult<Option<PassengerProfile>>;

    async fn find_driver_by_id(&self, id: Uuid) -> AppResult<Option<DriverProfile>>;

    async fn set_driver_online(&self, user_id: Uuid, online: bool) -> AppResult<Option<DriverProfile>>;

    async fn add_vehicle(&self, vehicle: &Vehicle) -> AppResult<Vehicle>;

    async fn list_vehicles(&self, driver_id: Uuid) -> AppResult<Vec<Vehicle>>;
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    phone_number: String,
    user_type: String,
    password_hash: String,
    is_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone_number: row.phone_number,
            user_type: row.user_type.parse().map_err(AppError::Internal)?,
            password_hash: row.password_hash,
            is_verified: row.is_verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PassengerRow {
    id: Uuid,
    user_id: Uuid,
    home_address: String,
    work_address: String,
    favorite_locations: serde_json::Value,
    emergency_contact: String,
    rating: f64,
    total_rides: i32,
}

impl From<PassengerRow> for PassengerProfile {
    fn from(row: PassengerRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            home_address: row.home_address,
            work_address: row.work_address,
            favorite_locations: row.favorite_locations,
            emergency_contact: row.emergency_contact,
            rating: row.rating,
            total_rides: row.total_rides,
        }
    }
}

#[derive(Debug, FromRow)]
struct DriverRow {
    id: Uuid,
    user_id: Uuid,
    license_number: String,
    license_expiry: NaiveDate,
    status: String,
    is_online: bool,
    current_location: serde_json::Value,
    rating: f64,
    total_rides: i32,
    total_earnings: Decimal,
    bank_account: String,
}

impl TryFrom<DriverRow> for DriverProfile {
    type Error = AppError;

    fn try_from(row: DriverRow) -> Result<Self, Self::Error> {
        Ok(DriverProfile {
            id: row.id,
            user_id: row.user_id,
            license_number: row.license_number,
            license_expiry: row.license_expiry,
            status: row.status.parse().map_err(AppError::Internal)?,
            is_online: row.is_online,
            current_location: row.current_location,
            rating: row.rating,
            total_rides: row.total_rides,
            total_earnings: row.total_earnings,
            bank_account: row.bank_account,
        })
    }
}

#[derive(Debug, FromRow)]
struct VehicleRow {
    id: Uuid,
    driver_id: Uuid,
    make: String,
    model: String,
    year: i32,
    license_plate: String,
    color: String,
    seats: i32,
    vehicle_type: String,
    registration_number: String,
    insurance_expiry: NaiveDate,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = AppError;

    fn try_from(row: VehicleRow) -> Result<Self, Self::Error> {
        Ok(Vehicle {
            id: row.id,
            driver_id: row.driver_id,
            make: row.make,
            model: row.model,
            year: row.year,
            license_plate: row.license_plate,
            color: row.color,
            seats: row.seats,
            vehicle_type: row.vehicle_type.parse().map_err(AppError::Internal)?,
            registration_number: row.registration_number,
            insurance_expiry: row.insurance_expiry,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

/// Implementación PostgreSQL
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unique_or_database(error: sqlx::Error, message: String) -> AppError {
    if is_unique_violation(&error) {
        AppError::UniquenessViolation(message)
    } else {
        AppError::Database(error)
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn create_user(&self, new_user: NewUser, profile: ProfileDraft) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (
                id, username, email, first_name, last_name, phone_number,
                user_type, password_hash, is_verified, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, $9, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.phone_number)
        .bind(new_user.user_type.as_str())
        .bind(&new_user.password_hash)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            unique_or_database(e, "A user with this username or phone number already exists".to_string())
        })?;

        let user = User::try_from(row)?;

        match profile {
            ProfileDraft::Passenger => {
                let passenger = PassengerProfile::for_user(user.id);
                sqlx::query(
                    r#"
                    INSERT INTO passenger_profiles (
                        id, user_id, home_address, work_address, favorite_locations,
                        emergency_contact, rating, total_rides
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    "#,
                )
                .bind(passenger.id)
                .bind(passenger.user_id)
                .bind(&passenger.home_address)
                .bind(&passenger.work_address)
                .bind(&passenger.favorite_locations)
                .bind(&passenger.emergency_contact)
                .bind(passenger.rating)
                .bind(passenger.total_rides)
                .execute(&mut *tx)
                .await?;
            }
            ProfileDraft::Driver { license_number, license_expiry } => {
                let driver = DriverProfile::for_user(user.id, license_number, license_expiry);
                sqlx::query(
                    r#"
                    INSERT INTO driver_profiles (
                        id, user_id, license_number, license_expiry, status, is_online,
                        current_location, rating, total_rides, total_earnings, bank_account
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                    "#,
                )
                .bind(driver.id)
                .bind(driver.user_id)
                .bind(&driver.license_number)
                .bind(driver.license_expiry)
                .bind(driver.status.as_str())
                .bind(driver.is_online)
                .bind(&driver.current_location)
                .bind(driver.rating)
                .bind(driver.total_rides)
                .bind(driver.total_earnings)
                .bind(&driver.bank_account)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    unique_or_database(
                        e,
                        format!("Driver license '{}' is already registered", driver.license_number),
                    )
                })?;
            }
            ProfileDraft::None => {}
        }

        tx.commit().await?;
        log::info!("👤 Usuario {} creado ({})", user.username, user.user_type);
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_passenger_by_user(&self, user_id: Uuid) -> AppResult<Option<PassengerProfile>> {
        let row = sqlx::query_as::<_, PassengerRow>("SELECT * FROM passenger_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(PassengerProfile::from))
    }

    async fn find_driver_by_user(&self, user_id: Uuid) -> AppResult<Option<DriverProfile>> {
        sqlx::query_as::<_, DriverRow>("SELECT * FROM driver_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(DriverProfile::try_from)
            .transpose()
    }

    async fn find_passenger_by_id(&self, id: Uuid) -> AppResult<Option<PassengerProfile>> {
        let row = sqlx::query_as::<_, PassengerRow>("SELECT * FROM passenger_profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(PassengerProfile::from))
    }

    async fn find_driver_by_id(&self, id: Uuid) -> AppResult<Option<DriverProfile>> {
        sqlx::query_as::<_, DriverRow>("SELECT * FROM driver_profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(DriverProfile::try_from)
            .transpose()
    }

    async fn set_driver_online(&self, user_id: Uuid, online: bool) -> AppResult<Option<DriverProfile>> {
        sqlx::query_as::<_, DriverRow>(
            "UPDATE driver_profiles SET is_online = $2 WHERE user_id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(online)
        .fetch_optional(&self.pool)
        .await?
        .map(DriverProfile::try_from)
        .transpose()
    }

    async fn add_vehicle(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        let row = sqlx::query_as::<_, VehicleRow>(
            r#"
            INSERT INTO vehicles (
                id, driver_id, make, model, year, license_plate, color, seats,
                vehicle_type, registration_number, insurance_expiry, is_active, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(vehicle.id)
        .bind(vehicle.driver_id)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(&vehicle.license_plate)
        .bind(&vehicle.color)
        .bind(vehicle.seats)
        .bind(vehicle.vehicle_type.as_str())
        .bind(&vehicle.registration_number)
        .bind(vehicle.insurance_expiry)
        .bind(vehicle.is_active)
        .bind(vehicle.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            unique_or_database(
                e,
                format!(
                    "Vehicle with plate '{}' or registration '{}' already exists",
                    vehicle.license_plate, vehicle.registration_number
                ),
            )
        })?;

        Vehicle::try_from(row)
    }

    async fn list_vehicles(&self, driver_id: Uuid) -> AppResult<Vec<Vehicle>> {
        let rows = sqlx::query_as::<_, VehicleRow>(
            "SELECT * FROM vehicles WHERE driver_id = $1 ORDER BY created_at ASC",
        )
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Vehicle::try_from).collect()
    }
}
