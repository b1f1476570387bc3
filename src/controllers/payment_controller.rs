use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::dto::payment_dto::{CreatePaymentMethodRequest, SettleRideRequest};
use crate::models::payment::{
    Invoice, InvoiceBreakdown, PaymentMethod, PaymentMethodType, Settlement, Transaction,
};
use crate::models::ride::RideStatus;
use crate::repositories::{IdentityStore, PaymentLedger, RideRepository, SettlementRequest};
use crate::state::AppState;
use crate::utils::errors::{field_error, invalid_transition_error, not_found_error, AppError, AppResult};
use crate::utils::validation::validate_money;

pub struct PaymentController {
    rides: Arc<dyn RideRepository>,
    identities: Arc<dyn IdentityStore>,
    ledger: Arc<dyn PaymentLedger>,
}

/// Importes válidos, surge >= 1 y total igual al importe liquidado
fn validate_breakdown(breakdown: &InvoiceBreakdown, amount: Decimal) -> AppResult<()> {
    for value in [
        breakdown.base_fare,
        breakdown.distance_charge,
        breakdown.time_charge,
        breakdown.discount,
        breakdown.tax,
    ] {
        validate_money(value).map_err(|e| field_error("breakdown", e))?;
    }
    if breakdown.surge_multiplier < 1.0 {
        let mut error = ValidationError::new("surge_multiplier");
        error.add_param("value".into(), &breakdown.surge_multiplier);
        return Err(field_error("breakdown", error));
    }
    if breakdown.total() != Some(amount) {
        let mut error = ValidationError::new("breakdown_total");
        error.message = Some(format!("Breakdown does not add up to the settled amount {}", amount).into());
        error.add_param("amount".into(), &amount);
        error.add_param("computed".into(), &breakdown.total());
        return Err(field_error("breakdown", error));
    }
    Ok(())
}

impl PaymentController {
    pub fn new(state: &AppState) -> Self {
        Self {
            rides: state.rides.clone(),
            identities: state.identities.clone(),
            ledger: state.ledger.clone(),
        }
    }

    /// Liquida un viaje completado contra el ledger
    pub async fn settle(&self, ride_id: Uuid, request: SettleRideRequest) -> AppResult<Settlement> {
        let ride = self
            .rides
            .find_by_id(ride_id)
            .await?
            .ok_or_else(|| not_found_error("Ride", &ride_id.to_string()))?;

        if ride.status != RideStatus::Completed {
            return Err(invalid_transition_error("settled", Some(ride.status)));
        }

        let passenger = self
            .identities
            .find_passenger_by_id(ride.passenger_id)
            .await?
            .ok_or_else(|| not_found_error("Passenger", &ride.passenger_id.to_string()))?;

        if let Some(method_id) = request.payment_method_id {
            let owned = self
                .ledger
                .find_payment_method(method_id)
                .await?
                .is_some_and(|method| method.user_id == passenger.user_id);
            if !owned {
                return Err(not_found_error("Payment method", &method_id.to_string()));
            }
        }

        let amount = ride.actual_fare.unwrap_or(ride.estimated_fare);
        let breakdown = request
            .breakdown
            .unwrap_or_else(|| InvoiceBreakdown::flat(amount));
        validate_breakdown(&breakdown, amount)?;

        self.ledger
            .settle(SettlementRequest {
                ride_id: ride.id,
                user_id: passenger.user_id,
                amount,
                payment_method_id: request.payment_method_id,
                breakdown,
            })
            .await
    }

    pub async fn get_invoice(&self, ride_id: Uuid) -> AppResult<Invoice> {
        self.ledger
            .find_invoice_by_ride(ride_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Invoice for ride '{}' not found", ride_id)))
    }

    pub async fn list_transactions(&self, user_id: Uuid) -> AppResult<Vec<Transaction>> {
        self.ledger.list_transactions(user_id).await
    }

    /// El primer método del usuario queda como default
    pub async fn add_payment_method(
        &self,
        user_id: Uuid,
        request: CreatePaymentMethodRequest,
    ) -> AppResult<PaymentMethod> {
        request.validate()?;

        if request.method_type == PaymentMethodType::Card && request.card_last_four.is_none() {
            let mut error = ValidationError::new("required");
            error.message = Some("Card payment methods require card_last_four".into());
            return Err(field_error("card_last_four", error));
        }

        let existing = self.ledger.list_payment_methods(user_id).await?;
        let now = Utc::now();

        let method = PaymentMethod {
            id: Uuid::new_v4(),
            user_id,
            method_type: request.method_type,
            card_last_four: request.card_last_four.unwrap_or_default(),
            card_brand: request.card_brand.unwrap_or_default(),
            wallet_balance: Decimal::ZERO,
            is_default: request.is_default || existing.is_empty(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.ledger.add_payment_method(&method).await
    }

    pub async fn list_payment_methods(&self, user_id: Uuid) -> AppResult<Vec<PaymentMethod>> {
        self.ledger.list_payment_methods(user_id).await
    }
}
