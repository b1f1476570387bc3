//! Payment Ledger
//!
//! Registra la transacción y el invoice de un viaje completado. Un viaje solo
//! se puede liquidar una vez (UNIQUE sobre invoices.ride_id).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::payment::{
    new_reference_number, Invoice, InvoiceBreakdown, PaymentMethod, Settlement, Transaction,
    TransactionStatus, TransactionType,
};
use crate::utils::errors::{is_unique_violation, AppError, AppResult};

/// Datos de una liquidación
#[derive(Debug, Clone)]
pub struct SettlementRequest {
    pub ride_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub payment_method_id: Option<Uuid>,
    pub breakdown: InvoiceBreakdown,
}

impl SettlementRequest {
    /// Construye la transacción y el invoice en memoria, listos para persistir
    pub fn build(&self, now: DateTime<Utc>) -> Settlement {
        let transaction = Transaction {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            ride_id: Some(self.ride_id),
            transaction_type: TransactionType::Payment,
            status: TransactionStatus::Completed,
            amount: self.amount,
            payment_method_id: self.payment_method_id,
            reference_number: new_reference_number(),
            description: format!("Payment for ride {}", self.ride_id),
            created_at: now,
            completed_at: Some(now),
        };

        let invoice = Invoice {
            id: Uuid::new_v4(),
            ride_id: self.ride_id,
            transaction_id: transaction.id,
            base_fare: self.breakdown.base_fare,
            distance_charge: self.breakdown.distance_charge,
            time_charge: self.breakdown.time_charge,
            surge_multiplier: self.breakdown.surge_multiplier,
            discount: self.breakdown.discount,
            tax: self.breakdown.tax,
            total_amount: self.amount,
            issued_at: now,
        };

        Settlement { transaction, invoice }
    }
}

#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Falla con `UniquenessViolation` si el viaje ya fue liquidado
    async fn settle(&self, request: SettlementRequest) -> AppResult<Settlement>;

    async fn find_invoice_by_ride(&self, ride_id: Uuid) -> AppResult<Option<Invoice>>;

    async fn list_transactions(&self, user_id: Uuid) -> AppResult<Vec<Transaction>>;

    /// Si el método es default, los demás métodos del usuario dejan de serlo
    async fn add_payment_method(&self, method: &PaymentMethod) -> AppResult<PaymentMethod>;

    async fn list_payment_methods(&self, user_id: Uuid) -> AppResult<Vec<PaymentMethod>>;

    async fn find_payment_method(&self, id: Uuid) -> AppResult<Option<PaymentMethod>>;
}

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: Uuid,
    user_id: Uuid,
    ride_id: Option<Uuid>,
    transaction_type: String,
    status: String,
    amount: Decimal,
    payment_method_id: Option<Uuid>,
    reference_number: String,
    description: String,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = AppError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(Transaction {
            id: row.id,
            user_id: row.user_id,
            ride_id: row.ride_id,
            transaction_type: row.transaction_type.parse().map_err(AppError::Internal)?,
            status: row.status.parse().map_err(AppError::Internal)?,
            amount: row.amount,
            payment_method_id: row.payment_method_id,
            reference_number: row.reference_number,
            description: row.description,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: Uuid,
    ride_id: Uuid,
    transaction_id: Uuid,
    base_fare: Decimal,
    distance_charge: Decimal,
    time_charge: Decimal,
    surge_multiplier: f64,
    discount: Decimal,
    tax: Decimal,
    total_amount: Decimal,
    issued_at: DateTime<Utc>,
}

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Self {
            id: row.id,
            ride_id: row.ride_id,
            transaction_id: row.transaction_id,
            base_fare: row.base_fare,
            distance_charge: row.distance_charge,
            time_charge: row.time_charge,
            surge_multiplier: row.surge_multiplier,
            discount: row.discount,
            tax: row.tax,
            total_amount: row.total_amount,
            issued_at: row.issued_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PaymentMethodRow {
    id: Uuid,
    user_id: Uuid,
    method_type: String,
    card_last_four: String,
    card_brand: String,
    wallet_balance: Decimal,
    is_default: bool,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentMethodRow> for PaymentMethod {
    type Error = AppError;

    fn try_from(row: PaymentMethodRow) -> Result<Self, Self::Error> {
        Ok(PaymentMethod {
            id: row.id,
            user_id: row.user_id,
            method_type: row.method_type.parse().map_err(AppError::Internal)?,
            card_last_four: row.card_last_four,
            card_brand: row.card_brand,
            wallet_balance: row.wallet_balance,
            is_default: row.is_default,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Implementación PostgreSQL
pub struct PgPaymentLedger {
    pool: PgPool,
}

impl PgPaymentLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentLedger for PgPaymentLedger {
    async fn settle(&self, request: SettlementRequest) -> AppResult<Settlement> {
        let settlement = request.build(Utc::now());
        let transaction = &settlement.transaction;
        let invoice = &settlement.invoice;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, user_id, ride_id, transaction_type, status, amount, payment_method_id,
                reference_number, description, created_at, completed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.user_id)
        .bind(transaction.ride_id)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.status.as_str())
        .bind(transaction.amount)
        .bind(transaction.payment_method_id)
        .bind(&transaction.reference_number)
        .bind(&transaction.description)
        .bind(transaction.created_at)
        .bind(transaction.completed_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, ride_id, transaction_id, base_fare, distance_charge, time_charge,
                surge_multiplier, discount, tax, total_amount, issued_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.ride_id)
        .bind(invoice.transaction_id)
        .bind(invoice.base_fare)
        .bind(invoice.distance_charge)
        .bind(invoice.time_charge)
        .bind(invoice.surge_multiplier)
        .bind(invoice.discount)
        .bind(invoice.tax)
        .bind(invoice.total_amount)
        .bind(invoice.issued_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::UniquenessViolation(format!("Ride {} has already been settled", invoice.ride_id))
            } else {
                AppError::Database(e)
            }
        })?;

        tx.commit().await?;
        log::info!(
            "💳 Ride {} liquidado: {} ({})",
            invoice.ride_id,
            transaction.amount,
            transaction.reference_number
        );

        Ok(settlement)
    }

    async fn find_invoice_by_ride(&self, ride_id: Uuid) -> AppResult<Option<Invoice>> {
        let row = sqlx::query_as::<_, InvoiceRow>("SELECT * FROM invoices WHERE ride_id = $1")
            .bind(ride_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Invoice::from))
    }

    async fn list_transactions(&self, user_id: Uuid) -> AppResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            "SELECT * FROM transactions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    async fn add_payment_method(&self, method: &PaymentMethod) -> AppResult<PaymentMethod> {
        let mut tx = self.pool.begin().await?;

        if method.is_default {
            sqlx::query("UPDATE payment_methods SET is_default = FALSE, updated_at = $2 WHERE user_id = $1")
                .bind(method.user_id)
                .bind(method.updated_at)
                .execute(&mut *tx)
                .await?;
        }

        let row = sqlx::query_as::<_, PaymentMethodRow>(
            r#"
            INSERT INTO payment_methods (
                id, user_id, method_type, card_last_four, card_brand, wallet_balance,
                is_default, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(method.id)
        .bind(method.user_id)
        .bind(method.method_type.as_str())
        .bind(&method.card_last_four)
        .bind(&method.card_brand)
        .bind(method.wallet_balance)
        .bind(method.is_default)
        .bind(method.is_active)
        .bind(method.created_at)
        .bind(method.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        PaymentMethod::try_from(row)
    }

    async fn list_payment_methods(&self, user_id: Uuid) -> AppResult<Vec<PaymentMethod>> {
        let rows = sqlx::query_as::<_, PaymentMethodRow>(
            "SELECT * FROM payment_methods WHERE user_id = $1 ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PaymentMethod::try_from).collect()
    }

    async fn find_payment_method(&self, id: Uuid) -> AppResult<Option<PaymentMethod>> {
        sqlx::query_as::<_, PaymentMethodRow>("SELECT * FROM payment_methods WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(PaymentMethod::try_from)
            .transpose()
    }
}
