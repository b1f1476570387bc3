//! Modelos del ledger de pagos
//!
//! Métodos de pago, transacciones e invoices asociados a viajes completados.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    Card,
    Wallet,
    BankTransfer,
    MobileMoney,
}

text_enum!(PaymentMethodType, "unknown payment method type" {
    Card => "card",
    Wallet => "wallet",
    BankTransfer => "bank_transfer",
    MobileMoney => "mobile_money",
});

/// Método de pago de un usuario
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub user_id: Uuid,
    pub method_type: PaymentMethodType,
    pub card_last_four: String,
    pub card_brand: String,
    pub wallet_balance: Decimal,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Payment,
    Refund,
    WalletTopup,
    Withdrawal,
}

text_enum!(TransactionType, "unknown transaction type" {
    Payment => "payment",
    Refund => "refund",
    WalletTopup => "wallet_topup",
    Withdrawal => "withdrawal",
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

text_enum!(TransactionStatus, "unknown transaction status" {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
    Cancelled => "cancelled",
});

/// Movimiento monetario ligado a un usuario y opcionalmente a un viaje
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub ride_id: Option<Uuid>,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub amount: Decimal,
    pub payment_method_id: Option<Uuid>,
    pub reference_number: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Desglose de la tarifa. Lo aporta quien liquida y debe cuadrar con el importe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceBreakdown {
    pub base_fare: Decimal,
    #[serde(default)]
    pub distance_charge: Decimal,
    #[serde(default)]
    pub time_charge: Decimal,
    #[serde(default = "default_surge")]
    pub surge_multiplier: f64,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub tax: Decimal,
}

fn default_surge() -> f64 {
    1.0
}

impl InvoiceBreakdown {
    /// Todo el importe como tarifa base
    pub fn flat(amount: Decimal) -> Self {
        Self {
            base_fare: amount,
            distance_charge: Decimal::ZERO,
            time_charge: Decimal::ZERO,
            surge_multiplier: default_surge(),
            discount: Decimal::ZERO,
            tax: Decimal::ZERO,
        }
    }

    /// `(base + distancia + tiempo) * surge - descuento + impuestos`, a 2 decimales.
    /// `None` si el surge no es representable o la cuenta desborda.
    pub fn total(&self) -> Option<Decimal> {
        let surge = Decimal::try_from(self.surge_multiplier).ok()?;
        let subtotal = self
            .base_fare
            .checked_add(self.distance_charge)?
            .checked_add(self.time_charge)?;
        let total = subtotal
            .checked_mul(surge)?
            .checked_sub(self.discount)?
            .checked_add(self.tax)?;
        Some(total.round_dp(2))
    }
}

/// Invoice 1:1 con un viaje completado y su transacción
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Invoice {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub transaction_id: Uuid,
    pub base_fare: Decimal,
    pub distance_charge: Decimal,
    pub time_charge: Decimal,
    pub surge_multiplier: f64,
    pub discount: Decimal,
    pub tax: Decimal,
    pub total_amount: Decimal,
    pub issued_at: DateTime<Utc>,
}

/// Resultado de liquidar un viaje
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Settlement {
    pub transaction: Transaction,
    pub invoice: Invoice,
}

/// Genera el número de referencia único de una transacción
pub fn new_reference_number() -> String {
    format!("TXN-{}", Uuid::new_v4().simple()).to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_numbers_are_unique_and_prefixed() {
        let a = new_reference_number();
        let b = new_reference_number();
        assert!(a.starts_with("TXN-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_breakdown_defaults_when_deserialized() {
        let breakdown: InvoiceBreakdown =
            serde_json::from_str(r#"{"base_fare": "10.00", "tax": "1.50"}"#).expect("valid json");
        assert_eq!(breakdown.surge_multiplier, 1.0);
        assert_eq!(breakdown.discount, Decimal::ZERO);
        assert_eq!(breakdown.tax, Decimal::new(150, 2));
    }

    #[test]
    fn test_breakdown_total() {
        let breakdown = InvoiceBreakdown {
            base_fare: Decimal::new(1000, 2),
            distance_charge: Decimal::new(200, 2),
            time_charge: Decimal::ZERO,
            surge_multiplier: 1.5,
            discount: Decimal::new(300, 2),
            tax: Decimal::new(120, 2),
        };
        assert_eq!(breakdown.total(), Some(Decimal::new(1620, 2)));
        assert_eq!(InvoiceBreakdown::flat(Decimal::new(1234, 2)).total(), Some(Decimal::new(1234, 2)));

        let broken = InvoiceBreakdown { surge_multiplier: f64::NAN, ..breakdown };
        assert_eq!(broken.total(), None);
    }
}
