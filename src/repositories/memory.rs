//! Almacenamiento en memoria
//!
//! Implementa los tres puertos de persistencia sobre un único
//! `Arc<RwLock<..>>`. Se usa con `STORAGE=memory` y en los tests. Cada
//! operación toma el lock de escritura durante todo el check-and-set, así que
//! las garantías de unicidad y de transición son las mismas que en PostgreSQL.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::payment::{Invoice, PaymentMethod, Settlement, Transaction};
use crate::models::ride::{Rating, Ride, RideLocation, RideStatus, RideTransition};
use crate::models::user::{DriverProfile, NewUser, PassengerProfile, User, Vehicle};
use crate::repositories::identity_repository::{IdentityStore, ProfileDraft};
use crate::repositories::payment_repository::{PaymentLedger, SettlementRequest};
use crate::repositories::ride_repository::RideRepository;
use crate::utils::errors::{uniqueness_error, AppError, AppResult};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    passengers: HashMap<Uuid, PassengerProfile>,
    drivers: HashMap<Uuid, DriverProfile>,
    vehicles: Vec<Vehicle>,
    rides: HashMap<Uuid, Ride>,
    locations: Vec<RideLocation>,
    ratings: Vec<Rating>,
    payment_methods: Vec<PaymentMethod>,
    transactions: Vec<Transaction>,
    invoices: HashMap<Uuid, Invoice>,
}

/// Store en memoria, clonable y compartido entre handlers
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_rides<'a>(rides: impl Iterator<Item = &'a Ride>) -> Vec<Ride> {
    let mut rides: Vec<Ride> = rides.cloned().collect();
    rides.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rides
}

fn matches_status(ride: &Ride, status: Option<RideStatus>) -> bool {
    status.map_or(true, |status| ride.status == status)
}

#[async_trait]
impl RideRepository for InMemoryStore {
    async fn create(&self, ride: &Ride) -> AppResult<Ride> {
        let mut tables = self.tables.write().await;
        if tables.rides.contains_key(&ride.id) {
            return Err(AppError::UniquenessViolation(format!("Ride {} already exists", ride.id)));
        }
        tables.rides.insert(ride.id, ride.clone());
        Ok(ride.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Ride>> {
        Ok(self.tables.read().await.rides.get(&id).cloned())
    }

    async fn transition(&self, id: Uuid, transition: &RideTransition) -> AppResult<Option<Ride>> {
        let mut tables = self.tables.write().await;
        let Some(ride) = tables.rides.get_mut(&id) else {
            return Ok(None);
        };

        if ride.apply(transition) {
            Ok(Some(ride.clone()))
        } else {
            Ok(None)
        }
    }

    async fn list_for_passenger(
        &self,
        passenger_id: Uuid,
        status: Option<RideStatus>,
    ) -> AppResult<Vec<Ride>> {
        let tables = self.tables.read().await;
        Ok(sorted_rides(
            tables
                .rides
                .values()
                .filter(|ride| ride.passenger_id == passenger_id && matches_status(ride, status)),
        ))
    }

    async fn list_for_driver(
        &self,
        driver_id: Uuid,
        status: Option<RideStatus>,
    ) -> AppResult<Vec<Ride>> {
        let tables = self.tables.read().await;
        Ok(sorted_rides(
            tables
                .rides
                .values()
                .filter(|ride| ride.driver_id == Some(driver_id) && matches_status(ride, status)),
        ))
    }

    async fn add_location(&self, location: &RideLocation) -> AppResult<RideLocation> {
        self.tables.write().await.locations.push(location.clone());
        Ok(location.clone())
    }

    async fn list_locations(&self, ride_id: Uuid) -> AppResult<Vec<RideLocation>> {
        let tables = self.tables.read().await;
        let mut locations: Vec<RideLocation> = tables
            .locations
            .iter()
            .filter(|location| location.ride_id == ride_id)
            .cloned()
            .collect();
        locations.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(locations)
    }

    async fn create_rating(&self, rating: &Rating) -> AppResult<Rating> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .ratings
            .iter()
            .any(|existing| existing.ride_id == rating.ride_id && existing.rater_id == rating.rater_id);
        if duplicate {
            return Err(uniqueness_error("Rating", "rater", &rating.rater_id.to_string()));
        }
        tables.ratings.push(rating.clone());
        Ok(rating.clone())
    }

    async fn list_ratings(&self, ride_id: Uuid) -> AppResult<Vec<Rating>> {
        let tables = self.tables.read().await;
        Ok(tables
            .ratings
            .iter()
            .filter(|rating| rating.ride_id == ride_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn create_user(&self, new_user: NewUser, profile: ProfileDraft) -> AppResult<User> {
        let mut tables = self.tables.write().await;

        let taken = tables.users.values().any(|user| {
            user.username == new_user.username || user.phone_number == new_user.phone_number
        });
        if taken {
            return Err(AppError::UniquenessViolation(
                "A user with this username or phone number already exists".to_string(),
            ));
        }

        if let ProfileDraft::Driver { license_number, .. } = &profile {
            if tables.drivers.values().any(|driver| &driver.license_number == license_number) {
                return Err(AppError::UniquenessViolation(format!(
                    "Driver license '{}' is already registered",
                    license_number
                )));
            }
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            phone_number: new_user.phone_number,
            user_type: new_user.user_type,
            password_hash: new_user.password_hash,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };

        match profile {
            ProfileDraft::Passenger => {
                let passenger = PassengerProfile::for_user(user.id);
                tables.passengers.insert(passenger.id, passenger);
            }
            ProfileDraft::Driver { license_number, license_expiry } => {
                let driver = DriverProfile::for_user(user.id, license_number, license_expiry);
                tables.drivers.insert(driver.id, driver);
            }
            ProfileDraft::None => {}
        }

        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|user| user.username == username).cloned())
    }

    async fn find_passenger_by_user(&self, user_id: Uuid) -> AppResult<Option<PassengerProfile>> {
        let tables = self.tables.read().await;
        Ok(tables.passengers.values().find(|p| p.user_id == user_id).cloned())
    }

    async fn find_driver_by_user(&self, user_id: Uuid) -> AppResult<Option<DriverProfile>> {
        let tables = self.tables.read().await;
        Ok(tables.drivers.values().find(|d| d.user_id == user_id).cloned())
    }

    async fn find_passenger_by_id(&self, id: Uuid) -> AppResult<Option<PassengerProfile>> {
        Ok(self.tables.read().await.passengers.get(&id).cloned())
    }

    async fn find_driver_by_id(&self, id: Uuid) -> AppResult<Option<DriverProfile>> {
        Ok(self.tables.read().await.drivers.get(&id).cloned())
    }

    async fn set_driver_online(&self, user_id: Uuid, online: bool) -> AppResult<Option<DriverProfile>> {
        let mut tables = self.tables.write().await;
        let driver = tables.drivers.values_mut().find(|d| d.user_id == user_id);
        Ok(driver.map(|driver| {
            driver.is_online = online;
            driver.clone()
        }))
    }

    async fn add_vehicle(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        let mut tables = self.tables.write().await;
        if tables.vehicles.iter().any(|v| v.license_plate == vehicle.license_plate) {
            return Err(uniqueness_error("Vehicle", "license plate", &vehicle.license_plate));
        }
        if tables
            .vehicles
            .iter()
            .any(|v| v.registration_number == vehicle.registration_number)
        {
            return Err(uniqueness_error(
                "Vehicle",
                "registration number",
                &vehicle.registration_number,
            ));
        }
        tables.vehicles.push(vehicle.clone());
        Ok(vehicle.clone())
    }

    async fn list_vehicles(&self, driver_id: Uuid) -> AppResult<Vec<Vehicle>> {
        let tables = self.tables.read().await;
        Ok(tables
            .vehicles
            .iter()
            .filter(|vehicle| vehicle.driver_id == driver_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PaymentLedger for InMemoryStore {
    async fn settle(&self, request: SettlementRequest) -> AppResult<Settlement> {
        let mut tables = self.tables.write().await;
        if tables.invoices.contains_key(&request.ride_id) {
            return Err(AppError::UniquenessViolation(format!(
                "Ride {} has already been settled",
                request.ride_id
            )));
        }

        let settlement = request.build(Utc::now());
        tables.transactions.push(settlement.transaction.clone());
        tables.invoices.insert(request.ride_id, settlement.invoice.clone());
        Ok(settlement)
    }

    async fn find_invoice_by_ride(&self, ride_id: Uuid) -> AppResult<Option<Invoice>> {
        Ok(self.tables.read().await.invoices.get(&ride_id).cloned())
    }

    async fn list_transactions(&self, user_id: Uuid) -> AppResult<Vec<Transaction>> {
        let tables = self.tables.read().await;
        let mut transactions: Vec<Transaction> = tables
            .transactions
            .iter()
            .filter(|transaction| transaction.user_id == user_id)
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(transactions)
    }

    async fn add_payment_method(&self, method: &PaymentMethod) -> AppResult<PaymentMethod> {
        let mut tables = self.tables.write().await;
        if method.is_default {
            for existing in tables
                .payment_methods
                .iter_mut()
                .filter(|existing| existing.user_id == method.user_id)
            {
                existing.is_default = false;
                existing.updated_at = method.updated_at;
            }
        }
        tables.payment_methods.push(method.clone());
        Ok(method.clone())
    }

    async fn list_payment_methods(&self, user_id: Uuid) -> AppResult<Vec<PaymentMethod>> {
        let tables = self.tables.read().await;
        Ok(tables
            .payment_methods
            .iter()
            .filter(|method| method.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_payment_method(&self, id: Uuid) -> AppResult<Option<PaymentMethod>> {
        let tables = self.tables.read().await;
        Ok(tables.payment_methods.iter().find(|method| method.id == id).cloned())
    }
}
