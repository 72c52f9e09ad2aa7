// sauda_core/src/models/pending_payment.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::Type)]
#[sqlx(type_name = "pending_payment_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PendingPaymentStatus {
  #[sqlx(rename = "PENDING")]
  Pending,
  #[sqlx(rename = "COMPLETED")]
  Completed,
  #[sqlx(rename = "EXPIRED")]
  Expired,
}

/// Time-boxed bridge between an external redirect payment flow and eventual
/// order creation. Becomes EXPIRED when provider creation fails or when
/// reconciliation arrives past `expires_at`; becomes COMPLETED exactly once,
/// at which point the linked order exists. One row never produces two orders.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PendingPayment {
  pub id: Uuid,
  pub customer_id: Uuid,
  pub store_id: Uuid,
  pub address_id: Uuid,
  /// The submitted cart lines, serialized; deserialized back on completion.
  pub items_json: serde_json::Value,
  pub amount: Decimal,
  pub status: PendingPaymentStatus,
  pub provider_intent_id: Option<String>,
  pub expires_at: DateTime<Utc>,
  pub created_at: DateTime<Utc>,
}
