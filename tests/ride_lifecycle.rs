//! Tests de integración del ciclo de vida de un viaje sobre el store en memoria

use chrono::NaiveDate;
use futures::future::join_all;
use rust_decimal::Decimal;
use uuid::Uuid;

use rideshare_backend::config::environment::EnvironmentConfig;
use rideshare_backend::controllers::{PaymentController, RideController, UserController};
use rideshare_backend::dto::payment_dto::{CreatePaymentMethodRequest, SettleRideRequest};
use rideshare_backend::dto::ride_dto::{LocationRequest, RateRideRequest, RequestRideRequest};
use rideshare_backend::dto::user_dto::CreateVehicleRequest;
use rideshare_backend::models::payment::{InvoiceBreakdown, PaymentMethodType, TransactionStatus};
use rideshare_backend::models::ride::RideStatus;
use rideshare_backend::models::user::{NewUser, UserType, Vehicle, VehicleType};
use rideshare_backend::repositories::ProfileDraft;
use rideshare_backend::{AppError, AppState};

async fn create_user(state: &AppState, username: &str, phone: &str, profile: ProfileDraft) -> Uuid {
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
                first_name: username.to_string(),
                last_name: String::new(),
                phone_number: phone.to_string(),
                user_type,
                password_hash: String::new(),
            },
            profile,
        )
        .await
        .expect("user created")
        .id
}

fn driver_profile(license: &str) -> ProfileDraft {
    ProfileDraft::Driver {
        license_number: license.to_string(),
        license_expiry: NaiveDate::from_ymd_opt(2030, 1, 1).expect("valid date"),
    }
}

fn ride_request() -> RequestRideRequest {
    RequestRideRequest {
        pickup_location: LocationRequest { lat: 0.0, lng: 0.0, address: "A".to_string() },
        dropoff_location: LocationRequest { lat: 1.0, lng: 1.0, address: "B".to_string() },
        estimated_distance: 5.0,
        estimated_duration: 10,
        estimated_fare: Decimal::new(1200, 2),
        scheduled_time: None,
    }
}

struct World {
    state: AppState,
    passenger: Uuid,
    driver: Uuid,
}

async fn world() -> World {
    let state = AppState::in_memory(EnvironmentConfig::default());
    let passenger = create_user(&state, "p1", "1000000001", ProfileDraft::Passenger).await;
    let driver = create_user(&state, "d1", "1000000002", driver_profile("LIC-D1")).await;
    World { state, passenger, driver }
}

#[tokio::test]
async fn test_full_ride_scenario() {
    let w = world().await;
    let rides = RideController::new(&w.state);

    let ride = rides.request_ride(w.passenger, ride_request()).await.unwrap();
    assert_eq!(ride.status, RideStatus::Requested);
    assert_eq!(ride.estimated_fare, Decimal::new(1200, 2));
    assert!(ride.driver_id.is_none());
    assert!(ride.started_at.is_none());

    let driver_profile = w.state.identities.find_driver_by_user(w.driver).await.unwrap().unwrap();
    let accepted = rides.accept_ride(w.driver, ride.id).await.unwrap();
    assert_eq!(accepted.status, RideStatus::Accepted);
    assert_eq!(accepted.driver_id, Some(driver_profile.id));

    let started = rides.start_ride(ride.id).await.unwrap();
    assert_eq!(started.status, RideStatus::Started);
    assert!(started.started_at.is_some());

    let completed = rides.complete_ride(ride.id, Some(Decimal::new(1500, 2))).await.unwrap();
    assert_eq!(completed.status, RideStatus::Completed);
    assert_eq!(completed.actual_fare, Some(Decimal::new(1500, 2)));
    assert!(completed.completed_at.is_some());
    assert!(completed.cancelled_at.is_none());

    // Estado terminal: ya no se puede cancelar
    let cancel = rides.cancel_ride(ride.id, None).await;
    assert!(matches!(
        cancel,
        Err(AppError::InvalidTransition { current: Some(RideStatus::Completed), .. })
    ));
    let stored = rides.get_ride(ride.id).await.unwrap().ride;
    assert_eq!(stored, completed);
}

#[tokio::test]
async fn test_complete_without_fare_uses_estimate() {
    let w = world().await;
    let rides = RideController::new(&w.state);

    let ride = rides.request_ride(w.passenger, ride_request()).await.unwrap();
    rides.accept_ride(w.driver, ride.id).await.unwrap();
    rides.start_ride(ride.id).await.unwrap();
    let completed = rides.complete_ride(ride.id, None).await.unwrap();

    assert_eq!(completed.actual_fare, Some(completed.estimated_fare));
}

#[tokio::test]
async fn test_transitions_out_of_order_fail_without_mutation() {
    let w = world().await;
    let rides = RideController::new(&w.state);
    let ride = rides.request_ride(w.passenger, ride_request()).await.unwrap();

    assert!(matches!(rides.start_ride(ride.id).await, Err(AppError::InvalidTransition { .. })));
    assert!(matches!(rides.complete_ride(ride.id, None).await, Err(AppError::InvalidTransition { .. })));

    let cancelled = rides.cancel_ride(ride.id, Some("no driver".to_string())).await.unwrap();
    assert_eq!(cancelled.cancellation_reason, "no driver");
    assert!(cancelled.cancelled_at.is_some());

    let accept = rides.accept_ride(w.driver, ride.id).await;
    assert!(matches!(
        accept,
        Err(AppError::InvalidTransition { current: Some(RideStatus::Cancelled), .. })
    ));
    let stored = rides.get_ride(ride.id).await.unwrap().ride;
    assert_eq!(stored.driver_id, None);
    assert_eq!(stored, cancelled);
}

#[tokio::test]
async fn test_accept_assigns_first_active_vehicle() {
    let w = world().await;
    let rides = RideController::new(&w.state);
    let driver = w.state.identities.find_driver_by_user(w.driver).await.unwrap().unwrap();

    let vehicle = Vehicle {
        id: Uuid::new_v4(),
        driver_id: driver.id,
        make: "Toyota".to_string(),
        model: "Prius".to_string(),
        year: 2021,
        license_plate: "1234-ABC".to_string(),
        color: "white".to_string(),
        seats: 4,
        vehicle_type: VehicleType::Economy,
        registration_number: "REG-1".to_string(),
        insurance_expiry: NaiveDate::from_ymd_opt(2027, 5, 1).unwrap(),
        is_active: true,
        created_at: chrono::Utc::now(),
    };
    w.state.identities.add_vehicle(&vehicle).await.unwrap();

    let ride = rides.request_ride(w.passenger, ride_request()).await.unwrap();
    let accepted = rides.accept_ride(w.driver, ride.id).await.unwrap();
    assert_eq!(accepted.vehicle_id, Some(vehicle.id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_accept_has_single_winner() {
    let w = world().await;
    let second_driver = create_user(&w.state, "d2", "1000000003", driver_profile("LIC-D2")).await;
    let rides = RideController::new(&w.state);
    let ride = rides.request_ride(w.passenger, ride_request()).await.unwrap();

    let contenders = [w.driver, second_driver, w.driver, second_driver];
    let controllers: Vec<RideController> =
        contenders.iter().map(|_| RideController::new(&w.state)).collect();
    let attempts = controllers
        .iter()
        .zip(contenders)
        .map(|(controller, driver)| controller.accept_ride(driver, ride.id));

    let results = join_all(attempts).await;

    let winners = results.iter().filter(|result| result.is_ok()).count();
    let losers = results
        .iter()
        .filter(|result| matches!(result, Err(AppError::InvalidTransition { .. })))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(losers, contenders.len() - 1);

    let stored = rides.get_ride(ride.id).await.unwrap().ride;
    assert_eq!(stored.status, RideStatus::Accepted);
}

#[tokio::test]
async fn test_rating_rules() {
    let w = world().await;
    let rides = RideController::new(&w.state);
    let ride = rides.request_ride(w.passenger, ride_request()).await.unwrap();
    rides.accept_ride(w.driver, ride.id).await.unwrap();

    for score in [0, 6] {
        let result = rides
            .rate_ride(w.passenger, RateRideRequest { ride_id: ride.id, rating: score, comment: None })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))), "score {} should fail", score);
    }

    let rating = rides
        .rate_ride(
            w.passenger,
            RateRideRequest { ride_id: ride.id, rating: 5, comment: Some("great".to_string()) },
        )
        .await
        .unwrap();
    assert_eq!(rating.ratee_id, w.driver);

    let duplicate = rides
        .rate_ride(w.passenger, RateRideRequest { ride_id: ride.id, rating: 1, comment: None })
        .await;
    assert!(matches!(duplicate, Err(AppError::UniquenessViolation(_))));

    // El conductor puede calificar el mismo viaje
    rides
        .rate_ride(w.driver, RateRideRequest { ride_id: ride.id, rating: 1, comment: None })
        .await
        .unwrap();

    let ratings = rides.list_ratings(ride.id).await.unwrap();
    assert_eq!(ratings.len(), 2);
    assert_eq!(ratings.iter().filter(|r| r.rater_id == w.passenger).count(), 1);
}

#[tokio::test]
async fn test_locations_are_recorded_in_order() {
    let w = world().await;
    let rides = RideController::new(&w.state);
    let ride = rides.request_ride(w.passenger, ride_request()).await.unwrap();

    rides.record_location(ride.id, 0.1, 0.1).await.unwrap();
    rides.record_location(ride.id, 0.2, 0.2).await.unwrap();

    let invalid = rides.record_location(ride.id, 120.0, 0.0).await;
    assert!(matches!(invalid, Err(AppError::Validation(_))));

    let missing = rides.record_location(Uuid::new_v4(), 0.0, 0.0).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let detail = rides.get_ride(ride.id).await.unwrap();
    let latitudes: Vec<f64> = detail.locations.iter().map(|l| l.latitude).collect();
    assert_eq!(latitudes, vec![0.1, 0.2]);
}

#[tokio::test]
async fn test_settlement_of_completed_ride() {
    let w = world().await;
    let rides = RideController::new(&w.state);
    let payments = PaymentController::new(&w.state);
    let ride = rides.request_ride(w.passenger, ride_request()).await.unwrap();

    let early = payments.settle(ride.id, SettleRideRequest::default()).await;
    assert!(matches!(
        early,
        Err(AppError::InvalidTransition { current: Some(RideStatus::Requested), .. })
    ));

    rides.accept_ride(w.driver, ride.id).await.unwrap();
    rides.start_ride(ride.id).await.unwrap();
    rides.complete_ride(ride.id, Some(Decimal::new(1500, 2))).await.unwrap();

    // Un desglose que no suma el importe no liquida nada
    let unbalanced = InvoiceBreakdown::flat(Decimal::new(500, 2));
    let rejected = payments
        .settle(ride.id, SettleRideRequest { payment_method_id: None, breakdown: Some(unbalanced) })
        .await;
    assert!(matches!(rejected, Err(AppError::Validation(_))));
    assert!(matches!(payments.get_invoice(ride.id).await, Err(AppError::NotFound(_))));

    let breakdown = InvoiceBreakdown {
        base_fare: Decimal::new(1000, 2),
        distance_charge: Decimal::new(300, 2),
        time_charge: Decimal::new(100, 2),
        surge_multiplier: 1.0,
        discount: Decimal::ZERO,
        tax: Decimal::new(100, 2),
    };
    let settlement = payments
        .settle(ride.id, SettleRideRequest { payment_method_id: None, breakdown: Some(breakdown) })
        .await
        .unwrap();

    assert_eq!(settlement.transaction.amount, Decimal::new(1500, 2));
    assert_eq!(settlement.transaction.status, TransactionStatus::Completed);
    assert_eq!(settlement.transaction.user_id, w.passenger);
    assert!(settlement.transaction.reference_number.starts_with("TXN-"));
    assert_eq!(settlement.invoice.total_amount, Decimal::new(1500, 2));
    assert_eq!(settlement.invoice.transaction_id, settlement.transaction.id);

    let again = payments.settle(ride.id, SettleRideRequest::default()).await;
    assert!(matches!(again, Err(AppError::UniquenessViolation(_))));

    let invoice = payments.get_invoice(ride.id).await.unwrap();
    assert_eq!(invoice, settlement.invoice);
    assert_eq!(payments.list_transactions(w.passenger).await.unwrap().len(), 1);
}

async fn completed_ride(w: &World) -> Uuid {
    let rides = RideController::new(&w.state);
    let ride = rides.request_ride(w.passenger, ride_request()).await.unwrap();
    rides.accept_ride(w.driver, ride.id).await.unwrap();
    rides.start_ride(ride.id).await.unwrap();
    rides.complete_ride(ride.id, None).await.unwrap();
    ride.id
}

#[tokio::test]
async fn test_settle_with_foreign_payment_method_is_not_found() {
    let w = world().await;
    let payments = PaymentController::new(&w.state);
    let ride_id = completed_ride(&w).await;

    let drivers_card = payments
        .add_payment_method(
            w.driver,
            CreatePaymentMethodRequest {
                method_type: PaymentMethodType::Card,
                card_last_four: Some("4242".to_string()),
                card_brand: Some("visa".to_string()),
                is_default: false,
            },
        )
        .await
        .unwrap();

    let foreign = payments
        .settle(ride_id, SettleRideRequest { payment_method_id: Some(drivers_card.id), breakdown: None })
        .await;
    assert!(matches!(foreign, Err(AppError::NotFound(_))));

    let unknown = payments
        .settle(ride_id, SettleRideRequest { payment_method_id: Some(Uuid::new_v4()), breakdown: None })
        .await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));

    // Con un método propio sí se liquida
    let own_wallet = payments
        .add_payment_method(
            w.passenger,
            CreatePaymentMethodRequest {
                method_type: PaymentMethodType::Wallet,
                card_last_four: None,
                card_brand: None,
                is_default: true,
            },
        )
        .await
        .unwrap();
    let settlement = payments
        .settle(ride_id, SettleRideRequest { payment_method_id: Some(own_wallet.id), breakdown: None })
        .await
        .unwrap();
    assert_eq!(settlement.transaction.payment_method_id, Some(own_wallet.id));
}

#[tokio::test]
async fn test_fares_must_fit_money_columns() {
    let w = world().await;
    let rides = RideController::new(&w.state);

    for fare in [Decimal::new(100_000_000, 0), Decimal::new(12345, 3)] {
        let mut request = ride_request();
        request.estimated_fare = fare;
        let result = rides.request_ride(w.passenger, request).await;
        assert!(matches!(result, Err(AppError::Validation(_))), "fare {} should fail", fare);
    }

    let ride = rides.request_ride(w.passenger, ride_request()).await.unwrap();
    rides.accept_ride(w.driver, ride.id).await.unwrap();
    rides.start_ride(ride.id).await.unwrap();

    let too_precise = rides.complete_ride(ride.id, Some(Decimal::new(12345, 3))).await;
    assert!(matches!(too_precise, Err(AppError::Validation(_))));
    let stored = rides.get_ride(ride.id).await.unwrap().ride;
    assert_eq!(stored.status, RideStatus::Started);
    assert!(stored.actual_fare.is_none());
}

fn vehicle_request(plate: &str, registration: &str) -> CreateVehicleRequest {
    CreateVehicleRequest {
        make: "Toyota".to_string(),
        model: "Corolla".to_string(),
        year: 2022,
        license_plate: plate.to_string(),
        color: "grey".to_string(),
        seats: 4,
        vehicle_type: VehicleType::Economy,
        registration_number: registration.to_string(),
        insurance_expiry: NaiveDate::from_ymd_opt(2027, 1, 1).expect("valid date"),
    }
}

#[tokio::test]
async fn test_duplicate_vehicle_is_rejected() {
    let w = world().await;
    let users = UserController::new(&w.state);

    let vehicle = users.add_vehicle(w.driver, vehicle_request(" ab-123 ", "REG-1")).await.unwrap();
    assert_eq!(vehicle.license_plate, "AB-123");

    // Misma matrícula una vez normalizada
    let same_plate = users.add_vehicle(w.driver, vehicle_request("AB-123", "REG-2")).await;
    assert!(matches!(same_plate, Err(AppError::UniquenessViolation(_))));

    let same_registration = users.add_vehicle(w.driver, vehicle_request("CD-456", "REG-1")).await;
    assert!(matches!(same_registration, Err(AppError::UniquenessViolation(_))));

    let long_plate = users
        .add_vehicle(w.driver, vehicle_request("AB-12-CD-34-EF-56-GH-78", "REG-3"))
        .await;
    assert!(matches!(long_plate, Err(AppError::Validation(_))));

    assert_eq!(users.list_vehicles(w.driver).await.unwrap().len(), 1);
}
