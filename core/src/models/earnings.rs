// sauda_core/src/models/earnings.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One row per order, written in the same transaction as the order itself.
/// `store_amount + commission_amount == order subtotal`. Immutable.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StoreEarning {
  pub id: Uuid,
  pub store_id: Uuid,
  pub order_id: Uuid,
  pub store_amount: Decimal,
  pub commission_amount: Decimal,
  pub created_at: DateTime<Utc>,
}

/// At most one row per order, written when the order reaches DELIVERED.
/// `earning_amount` equals the order's delivery fee. Creation is guarded by a
/// check-then-insert inside the delivering transaction, so a retried DELIVERED
/// transition can never pay a rider twice.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RiderEarning {
  pub id: Uuid,
  pub rider_id: Uuid,
  pub order_id: Uuid,
  pub earning_amount: Decimal,
  pub created_at: DateTime<Utc>,
}
