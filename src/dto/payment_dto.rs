use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::models::payment::{InvoiceBreakdown, PaymentMethodType};

// Request para liquidar un viaje completado
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettleRideRequest {
    pub payment_method_id: Option<Uuid>,
    pub breakdown: Option<InvoiceBreakdown>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePaymentMethodRequest {
    pub method_type: PaymentMethodType,
    #[serde(default)]
    #[validate(length(equal = 4))]
    pub card_last_four: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub card_brand: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}
