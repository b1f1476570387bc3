//! Repositorio de viajes
//!
//! Almacenamiento de Ride, RideLocation y Rating. Las transiciones de estado
//! se ejecutan como un UPDATE condicional sobre el estado esperado, de modo
//! que dos transiciones concurrentes sobre el mismo viaje no pueden ganar
//! ambas.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::models::ride::{Location, Rating, Ride, RideLocation, RideStatus, RideTransition};
use crate::utils::errors::{is_unique_violation, uniqueness_error, AppError, AppResult};

#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn create(&self, ride: &Ride) -> AppResult<Ride>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Ride>>;

    /// Compare-and-set del estado. `None` si el viaje no existe o si su estado
    /// actual no es uno de los estados de origen de la transición.
    async fn transition(&self, id: Uuid, transition: &RideTransition) -> AppResult<Option<Ride>>;

    async fn list_for_passenger(
        &self,
        passenger_id: Uuid,
        status: Option<RideStatus>,
    ) -> AppResult<Vec<Ride>>;

    async fn list_for_driver(
        &self,
        driver_id: Uuid,
        status: Option<RideStatus>,
    ) -> AppResult<Vec<Ride>>;

    async fn add_location(&self, location: &RideLocation) -> AppResult<RideLocation>;

    /// Breadcrumbs ordenados por timestamp ascendente; a igual timestamp, por orden de inserción
    async fn list_locations(&self, ride_id: Uuid) -> AppResult<Vec<RideLocation>>;

    /// Falla con `UniquenessViolation` si ya existe un rating del mismo rater
    async fn create_rating(&self, rating: &Rating) -> AppResult<Rating>;

    async fn list_ratings(&self, ride_id: Uuid) -> AppResult<Vec<Rating>>;
}

#[derive(Debug, FromRow)]
struct RideRow {
    id: Uuid,
    passenger_id: Uuid,
    driver_id: Option<Uuid>,
    vehicle_id: Option<Uuid>,
    pickup_location: Json<Location>,
    dropoff_location: Json<Location>,
    status: String,
    estimated_distance: f64,
    estimated_duration: i32,
    estimated_fare: Decimal,
    actual_fare: Option<Decimal>,
    scheduled_time: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    cancellation_reason: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RideRow> for Ride {
    type Error = AppError;

    fn try_from(row: RideRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<RideStatus>()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        Ok(Ride {
            id: row.id,
            passenger_id: row.passenger_id,
            driver_id: row.driver_id,
            vehicle_id: row.vehicle_id,
            pickup_location: row.pickup_location.0,
            dropoff_location: row.dropoff_location.0,
            status,
            estimated_distance: row.estimated_distance,
            estimated_duration: row.estimated_duration,
            estimated_fare: row.estimated_fare,
            actual_fare: row.actual_fare,
            scheduled_time: row.scheduled_time,
            started_at: row.started_at,
            completed_at: row.completed_at,
            cancelled_at: row.cancelled_at,
            cancellation_reason: row.cancellation_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RideLocationRow {
    id: Uuid,
    ride_id: Uuid,
    latitude: f64,
    longitude: f64,
    timestamp: DateTime<Utc>,
}

impl From<RideLocationRow> for RideLocation {
    fn from(row: RideLocationRow) -> Self {
        Self {
            id: row.id,
            ride_id: row.ride_id,
            latitude: row.latitude,
            longitude: row.longitude,
            timestamp: row.timestamp,
        }
    }
}

#[derive(Debug, FromRow)]
struct RatingRow {
    id: Uuid,
    ride_id: Uuid,
    rater_id: Uuid,
    ratee_id: Uuid,
    rating: i32,
    comment: String,
    created_at: DateTime<Utc>,
}

impl From<RatingRow> for Rating {
    fn from(row: RatingRow) -> Self {
        Self {
            id: row.id,
            ride_id: row.ride_id,
            rater_id: row.rater_id,
            ratee_id: row.ratee_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

fn into_rides(rows: Vec<RideRow>) -> AppResult<Vec<Ride>> {
    rows.into_iter().map(Ride::try_from).collect()
}

/// Implementación PostgreSQL
pub struct PgRideRepository {
    pool: PgPool,
}

impl PgRideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_by(
        &self,
        column: &str,
        owner_id: Uuid,
        status: Option<RideStatus>,
    ) -> AppResult<Vec<Ride>> {
        let sql = format!(
            "SELECT * FROM rides WHERE {} = $1 AND ($2::TEXT IS NULL OR status = $2) ORDER BY created_at DESC",
            column
        );

        let rows = sqlx::query_as::<_, RideRow>(&sql)
            .bind(owner_id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await?;

        into_rides(rows)
    }
}

#[async_trait]
impl RideRepository for PgRideRepository {
    async fn create(&self, ride: &Ride) -> AppResult<Ride> {
        let row = sqlx::query_as::<_, RideRow>(
            r#"
            INSERT INTO rides (
                id, passenger_id, driver_id, vehicle_id, pickup_location, dropoff_location,
                status, estimated_distance, estimated_duration, estimated_fare, actual_fare,
                scheduled_time, started_at, completed_at, cancelled_at, cancellation_reason,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING *
            "#,
        )
        .bind(ride.id)
        .bind(ride.passenger_id)
        .bind(ride.driver_id)
        .bind(ride.vehicle_id)
        .bind(Json(&ride.pickup_location))
        .bind(Json(&ride.dropoff_location))
        .bind(ride.status.as_str())
        .bind(ride.estimated_distance)
        .bind(ride.estimated_duration)
        .bind(ride.estimated_fare)
        .bind(ride.actual_fare)
        .bind(ride.scheduled_time)
        .bind(ride.started_at)
        .bind(ride.completed_at)
        .bind(ride.cancelled_at)
        .bind(&ride.cancellation_reason)
        .bind(ride.created_at)
        .bind(ride.updated_at)
        .fetch_one(&self.pool)
        .await?;

        log::debug!("💾 Ride {} insertado", row.id);
        Ride::try_from(row)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Ride>> {
        let row = sqlx::query_as::<_, RideRow>("SELECT * FROM rides WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Ride::try_from).transpose()
    }

    async fn transition(&self, id: Uuid, transition: &RideTransition) -> AppResult<Option<Ride>> {
        let expected: Vec<String> = transition
            .allowed_from()
            .iter()
            .map(|status| status.as_str().to_string())
            .collect();
        let target = transition.target().as_str();

        let query = match transition {
            RideTransition::Accept { driver_id, vehicle_id, at } => sqlx::query_as::<_, RideRow>(
                r#"
                UPDATE rides
                SET status = $3, driver_id = $4, vehicle_id = $5, updated_at = $6
                WHERE id = $1 AND status = ANY($2)
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(expected)
            .bind(target)
            .bind(*driver_id)
            .bind(*vehicle_id)
            .bind(*at),

            RideTransition::Start { at } => sqlx::query_as::<_, RideRow>(
                r#"
                UPDATE rides
                SET status = $3, started_at = $4, updated_at = $4
                WHERE id = $1 AND status = ANY($2)
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(expected)
            .bind(target)
            .bind(*at),

            RideTransition::Complete { at, actual_fare } => sqlx::query_as::<_, RideRow>(
                r#"
                UPDATE rides
                SET status = $3, completed_at = $4, updated_at = $4,
                    actual_fare = COALESCE($5, estimated_fare)
                WHERE id = $1 AND status = ANY($2)
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(expected)
            .bind(target)
            .bind(*at)
            .bind(*actual_fare),

            RideTransition::Cancel { at, reason } => sqlx::query_as::<_, RideRow>(
                r#"
                UPDATE rides
                SET status = $3, cancelled_at = $4, updated_at = $4, cancellation_reason = $5
                WHERE id = $1 AND status = ANY($2)
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(expected)
            .bind(target)
            .bind(*at)
            .bind(reason.clone()),
        };

        let row = query.fetch_optional(&self.pool).await?;
        row.map(Ride::try_from).transpose()
    }

    async fn list_for_passenger(
        &self,
        passenger_id: Uuid,
        status: Option<RideStatus>,
    ) -> AppResult<Vec<Ride>> {
        self.list_by("passenger_id", passenger_id, status).await
    }

    async fn list_for_driver(
        &self,
        driver_id: Uuid,
        status: Option<RideStatus>,
    ) -> AppResult<Vec<Ride>> {
        self.list_by("driver_id", driver_id, status).await
    }

    async fn add_location(&self, location: &RideLocation) -> AppResult<RideLocation> {
        let row = sqlx::query_as::<_, RideLocationRow>(
            r#"
            INSERT INTO ride_locations (id, ride_id, latitude, longitude, timestamp)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(location.id)
        .bind(location.ride_id)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(location.timestamp)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_locations(&self, ride_id: Uuid) -> AppResult<Vec<RideLocation>> {
        let rows = sqlx::query_as::<_, RideLocationRow>(
            "SELECT * FROM ride_locations WHERE ride_id = $1 ORDER BY timestamp ASC, seq ASC",
        )
        .bind(ride_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RideLocation::from).collect())
    }

    async fn create_rating(&self, rating: &Rating) -> AppResult<Rating> {
        let row = sqlx::query_as::<_, RatingRow>(
            r#"
            INSERT INTO ratings (id, ride_id, rater_id, ratee_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(rating.id)
        .bind(rating.ride_id)
        .bind(rating.rater_id)
        .bind(rating.ratee_id)
        .bind(rating.rating)
        .bind(&rating.comment)
        .bind(rating.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                uniqueness_error("Rating", "rater", &rating.rater_id.to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(row.into())
    }

    async fn list_ratings(&self, ride_id: Uuid) -> AppResult<Vec<Rating>> {
        let rows = sqlx::query_as::<_, RatingRow>(
            "SELECT * FROM ratings WHERE ride_id = $1 ORDER BY created_at ASC",
        )
        .bind(ride_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Rating::from).collect())
    }
}
