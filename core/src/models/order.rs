// sauda_core/src/models/order.rs

use crate::models::catalog::{Address, Store};
use crate::state_machine::{OrderStatus, Role};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
  #[sqlx(rename = "COD")]
  Cod,
  #[sqlx(rename = "CARD")]
  Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
  #[sqlx(rename = "PENDING")]
  Pending,
  #[sqlx(rename = "PAID")]
  Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "cancellation_reason")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancellationReason {
  #[sqlx(rename = "CUSTOMER_CANCELLED")]
  CustomerCancelled,
  #[sqlx(rename = "STORE_REJECTED")]
  StoreRejected,
  #[sqlx(rename = "ADMIN_CANCELLED")]
  AdminCancelled,
}

impl CancellationReason {
  /// Default reason recorded when the caller supplies none.
  pub fn default_for(role: Role) -> Self {
    match role {
      Role::Customer => CancellationReason::CustomerCancelled,
      Role::StoreOwner => CancellationReason::StoreRejected,
      Role::Rider | Role::Admin => CancellationReason::AdminCancelled,
    }
  }
}

/// The central entity. Money invariants: `total_amount == subtotal_amount +
/// delivery_fee + service_fee` and `commission_amount == subtotal_amount *
/// commission rate`. Mutated only through the state-machine-gated status
/// update; never hard-deleted.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub customer_id: Uuid,
  pub store_id: Uuid,
  pub address_id: Uuid,
  pub rider_id: Option<Uuid>,
  pub subtotal_amount: Decimal,
  pub delivery_fee: Decimal,
  pub service_fee: Decimal,
  pub commission_amount: Decimal,
  pub total_amount: Decimal,
  pub payment_method: PaymentMethod,
  pub payment_status: PaymentStatus,
  pub order_status: OrderStatus,
  pub cancellation_reason: Option<CancellationReason>,
  pub cancelled_by_role: Option<Role>,
  pub notes: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Line item with its price snapshot frozen at order time; never mutated even
/// when the catalog price later changes.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub price: Decimal,
}

/// Append-only audit trail: one row per status the order has held, including
/// the initial PENDING row written atomically with the order itself.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderStatusHistory {
  pub id: Uuid,
  pub order_id: Uuid,
  pub status: OrderStatus,
  /// Absent for system-generated entries.
  pub changed_by_user_id: Option<Uuid>,
  pub created_at: DateTime<Utc>,
}

/// An order with the relations callers want eagerly loaded in the immediate
/// response.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithDetails {
  #[serde(flatten)]
  pub order: Order,
  pub items: Vec<OrderItem>,
  pub store: Store,
  pub address: Address,
}
