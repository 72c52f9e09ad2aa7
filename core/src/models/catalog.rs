// sauda_core/src/models/catalog.rs

//! Collaborator-owned rows the workflow reads: stores, products, addresses,
//! and saved payment methods. Catalog CRUD lives elsewhere; the engine only
//! looks these up (and, for products, decrements stock inside its own
//! transactions).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Store {
  pub id: Uuid,
  pub owner_id: Uuid,
  pub name: String,
  pub address: String,
  pub phone: Option<String>,
  pub is_approved: bool,
  pub is_open: bool,
  /// "HH:MM", 24-hour clock. Absent means no bound.
  pub opening_time: Option<String>,
  pub closing_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub store_id: Uuid,
  pub name: String,
  pub price: Decimal,
  pub stock: i64,
  pub is_out_of_stock: bool,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Address {
  pub id: Uuid,
  pub user_id: Uuid,
  pub full_address: String,
  pub city: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SavedPaymentMethod {
  pub id: Uuid,
  pub user_id: Uuid,
  pub provider_id: String,
  pub brand: String,
  pub last4: String,
  pub created_at: DateTime<Utc>,
}
