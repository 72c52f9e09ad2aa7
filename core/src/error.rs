// sauda_core/src/error.rs
use crate::state_machine::OrderStatus;
use thiserror::Error;
use uuid::Uuid;

/// Engine error taxonomy. Every caller-facing failure of a workflow operation
/// is one of these; storage failures are wrapped and reported generically.
///
/// Ownership violations on orders deliberately report [`Error::OrderNotFound`]
/// rather than a "forbidden" variant, so an unauthorized caller cannot probe
/// for the existence of other people's orders.
#[derive(Debug, Error)]
pub enum Error {
  // --- Not found / not owned ---
  #[error("Address not found")]
  AddressNotFound,

  #[error("Store not found")]
  StoreNotFound,

  #[error("Order not found")]
  OrderNotFound,

  #[error("Product {product_id} not found")]
  ProductNotFound { product_id: Uuid },

  #[error("Rider not found")]
  RiderNotFound,

  #[error("Payment method not found or does not belong to you")]
  PaymentMethodNotFound,

  // --- Validation ---
  #[error("Validation error: {0}")]
  Validation(String),

  #[error("riderId is required when assigning a rider")]
  MissingRider,

  #[error("A confirmed payment intent or saved payment method is required for card orders")]
  MissingPaymentProof,

  // --- State conflicts ---
  #[error("Store is closed. Please try again during business hours.")]
  StoreClosed,

  #[error("Insufficient stock for {name}. Available: {available}")]
  InsufficientStock { name: String, available: i64 },

  #[error("Cannot change status from {from} to {to}")]
  InvalidTransition { from: OrderStatus, to: OrderStatus },

  // --- Payment failures ---
  #[error("Payment not confirmed. Please try again.")]
  PaymentNotConfirmed,

  #[error("Invalid or expired payment session")]
  SessionInvalid,

  #[error("Payment session expired")]
  SessionExpired,

  #[error("Payment provider error: {0}")]
  Provider(String),

  // --- Internal ---
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// True when the caller may retry the same request unchanged without risking
  /// a duplicated side effect. Only transient provider failures qualify: the
  /// pending payment stays PENDING and no order has been created.
  pub fn is_retryable(&self) -> bool {
    matches!(self, Error::PaymentNotConfirmed | Error::Provider(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
