//! Modelo de Ride
//!
//! Este módulo contiene el struct Ride, su máquina de estados y las
//! entidades que cuelgan de un viaje (breadcrumbs de ubicación y ratings).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Estado del viaje
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Requested,
    Accepted,
    Started,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub const ALL: [RideStatus; 5] = [
        RideStatus::Requested,
        RideStatus::Accepted,
        RideStatus::Started,
        RideStatus::Completed,
        RideStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Requested => "requested",
            RideStatus::Accepted => "accepted",
            RideStatus::Started => "started",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }

    /// Aristas válidas de la máquina de estados
    pub fn can_transition_to(&self, next: RideStatus) -> bool {
        matches!(
            (self, next),
            (RideStatus::Requested, RideStatus::Accepted)
                | (RideStatus::Accepted, RideStatus::Started)
                | (RideStatus::Started, RideStatus::Completed)
                | (RideStatus::Requested, RideStatus::Cancelled)
                | (RideStatus::Accepted, RideStatus::Cancelled)
                | (RideStatus::Started, RideStatus::Cancelled)
        )
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error al interpretar un estado desconocido
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ride status '{0}'")]
pub struct UnknownRideStatus(pub String);

impl FromStr for RideStatus {
    type Err = UnknownRideStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requested" => Ok(RideStatus::Requested),
            "accepted" => Ok(RideStatus::Accepted),
            "started" => Ok(RideStatus::Started),
            "completed" => Ok(RideStatus::Completed),
            "cancelled" => Ok(RideStatus::Cancelled),
            other => Err(UnknownRideStatus(other.to_string())),
        }
    }
}

/// Punto de recogida o destino: {lat, lng, address}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub address: String,
}

/// Estimación entregada por el cliente al solicitar el viaje
#[derive(Debug, Clone, PartialEq)]
pub struct RideEstimate {
    /// Distancia en km
    pub distance_km: f64,
    /// Duración en minutos
    pub duration_minutes: i32,
    pub fare: Decimal,
}

/// Ride principal
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Ride {
    pub id: Uuid,
    pub passenger_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub pickup_location: Location,
    pub dropoff_location: Location,
    pub status: RideStatus,
    pub estimated_distance: f64,
    pub estimated_duration: i32,
    pub estimated_fare: Decimal,
    pub actual_fare: Option<Decimal>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Datos para crear un viaje nuevo
#[derive(Debug, Clone)]
pub struct NewRide {
    pub passenger_id: Uuid,
    pub pickup_location: Location,
    pub dropoff_location: Location,
    pub estimate: RideEstimate,
    pub scheduled_time: Option<DateTime<Utc>>,
}

impl Ride {
    /// Construye un viaje recién solicitado
    pub fn requested(new_ride: NewRide, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            passenger_id: new_ride.passenger_id,
            driver_id: None,
            vehicle_id: None,
            pickup_location: new_ride.pickup_location,
            dropoff_location: new_ride.dropoff_location,
            status: RideStatus::Requested,
            estimated_distance: new_ride.estimate.distance_km,
            estimated_duration: new_ride.estimate.duration_minutes,
            estimated_fare: new_ride.estimate.fare,
            actual_fare: None,
            scheduled_time: new_ride.scheduled_time,
            started_at: None,
            completed_at: None,
            cancelled_at: None,
            cancellation_reason: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Aplica una transición ya validada contra el estado actual.
    ///
    /// Devuelve `false` sin tocar nada si el estado actual no es uno de los
    /// estados de origen permitidos.
    pub fn apply(&mut self, transition: &RideTransition) -> bool {
        if !transition.allowed_from().contains(&self.status) {
            return false;
        }

        match transition {
            RideTransition::Accept { driver_id, vehicle_id, .. } => {
                self.driver_id = Some(*driver_id);
                self.vehicle_id = *vehicle_id;
            }
            RideTransition::Start { at } => {
                self.started_at = Some(*at);
            }
            RideTransition::Complete { at, actual_fare } => {
                self.completed_at = Some(*at);
                self.actual_fare = Some(actual_fare.unwrap_or(self.estimated_fare));
            }
            RideTransition::Cancel { at, reason } => {
                self.cancelled_at = Some(*at);
                self.cancellation_reason = reason.clone();
            }
        }

        self.status = transition.target();
        self.updated_at = transition.at();
        true
    }
}

/// Transición atómica sobre un viaje: estado esperado → estado nuevo
#[derive(Debug, Clone, PartialEq)]
pub enum RideTransition {
    Accept {
        driver_id: Uuid,
        vehicle_id: Option<Uuid>,
        at: DateTime<Utc>,
    },
    Start {
        at: DateTime<Utc>,
    },
    Complete {
        at: DateTime<Utc>,
        actual_fare: Option<Decimal>,
    },
    Cancel {
        at: DateTime<Utc>,
        reason: String,
    },
}

impl RideTransition {
    pub fn target(&self) -> RideStatus {
        match self {
            RideTransition::Accept { .. } => RideStatus::Accepted,
            RideTransition::Start { .. } => RideStatus::Started,
            RideTransition::Complete { .. } => RideStatus::Completed,
            RideTransition::Cancel { .. } => RideStatus::Cancelled,
        }
    }

    /// Estados desde los que la transición es válida
    pub fn allowed_from(&self) -> Vec<RideStatus> {
        let target = self.target();
        RideStatus::ALL
            .into_iter()
            .filter(|status| status.can_transition_to(target))
            .collect()
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            RideTransition::Accept { at, .. }
            | RideTransition::Start { at }
            | RideTransition::Complete { at, .. }
            | RideTransition::Cancel { at, .. } => *at,
        }
    }

    /// Verbo usado en los mensajes de error
    pub fn verb(&self) -> &'static str {
        match self {
            RideTransition::Accept { .. } => "accepted",
            RideTransition::Start { .. } => "started",
            RideTransition::Complete { .. } => "completed",
            RideTransition::Cancel { .. } => "cancelled",
        }
    }
}

/// Breadcrumb de ubicación (append-only)
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RideLocation {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

/// Calificación de un viaje, única por (ride, rater)
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Rating {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub rater_id: Uuid,
    pub ratee_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ride() -> Ride {
        Ride::requested(
            NewRide {
                passenger_id: Uuid::new_v4(),
                pickup_location: Location { lat: 0.0, lng: 0.0, address: "A".to_string() },
                dropoff_location: Location { lat: 1.0, lng: 1.0, address: "B".to_string() },
                estimate: RideEstimate {
                    distance_km: 5.0,
                    duration_minutes: 10,
                    fare: Decimal::new(1200, 2),
                },
                scheduled_time: None,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_only_documented_edges_are_valid() {
        let mut valid = Vec::new();
        for from in RideStatus::ALL {
            for to in RideStatus::ALL {
                if from.can_transition_to(to) {
                    valid.push((from, to));
                }
            }
        }
        assert_eq!(valid.len(), 6);
        for terminal in [RideStatus::Completed, RideStatus::Cancelled] {
            assert!(terminal.is_terminal());
            assert!(RideStatus::ALL.iter().all(|to| !terminal.can_transition_to(*to)));
        }
    }

    #[test]
    fn test_status_round_trips_through_strings() {
        for status in RideStatus::ALL {
            assert_eq!(status.as_str().parse::<RideStatus>(), Ok(status));
        }
        assert!("en_route".parse::<RideStatus>().is_err());
    }

    #[test]
    fn test_cancel_allowed_from_every_non_terminal_state() {
        let cancel = RideTransition::Cancel { at: Utc::now(), reason: String::new() };
        assert_eq!(
            cancel.allowed_from(),
            vec![RideStatus::Requested, RideStatus::Accepted, RideStatus::Started]
        );
    }

    #[test]
    fn test_apply_rejects_wrong_source_without_mutation() {
        let mut ride = sample_ride();
        let before = ride.clone();

        let applied = ride.apply(&RideTransition::Start { at: Utc::now() });

        assert!(!applied);
        assert_eq!(ride, before);
    }

    #[test]
    fn test_complete_defaults_actual_fare_to_estimate() {
        let mut ride = sample_ride();
        let driver_id = Uuid::new_v4();
        assert!(ride.apply(&RideTransition::Accept { driver_id, vehicle_id: None, at: Utc::now() }));
        assert!(ride.apply(&RideTransition::Start { at: Utc::now() }));
        assert!(ride.apply(&RideTransition::Complete { at: Utc::now(), actual_fare: None }));

        assert_eq!(ride.status, RideStatus::Completed);
        assert_eq!(ride.actual_fare, Some(ride.estimated_fare));
        assert!(ride.completed_at.is_some());
    }
}
