// sauda_core/src/workflow/mod.rs

//! The transactional order workflow engine.
//!
//! One struct, [`OrderWorkflow`], owns every mutation of orders and their
//! satellite rows. Each public operation is a single atomic unit of work:
//! either every write (order, items, history, earnings, stock decrements)
//! commits, or none do. Concurrent access is serialized through row-level
//! locks (`SELECT ... FOR UPDATE`) on product rows, order rows, and pending
//! payment rows; there is no shared mutable state outside the database.
//!
//! Submodules by operation:
//!  - [`create`]: order creation (stock, payment proof, atomic inserts).
//!  - [`status`]: state-machine-gated status transitions and side effects.
//!  - [`sessions`]: redirect-based card payment preparation/reconciliation.

pub mod create;
pub mod sessions;
pub mod status;

pub use create::{NewOrder, PaymentProof};
pub use sessions::{PaymentRedirect, PaymentRequest};
pub use status::StatusChange;

use crate::error::{Error, Result};
use crate::fees::FeePolicy;
use crate::models::{Address, Order, OrderItem, OrderWithDetails, Store};
use crate::payments::{PaymentIntentCreator, PaymentVerifier};
use crate::state_machine::{self, OrderStatus, Role};
use crate::store_hours;
use chrono::Local;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Settings for redirect-based card payment sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
  /// How long a pending payment stays reconcilable.
  pub ttl_minutes: i64,
  /// Base URL the provider redirects to after payment; the pending payment id
  /// is appended as a query parameter.
  pub callback_url: String,
  /// Where the provider sends the customer on abort.
  pub cancel_url: Option<String>,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      ttl_minutes: 30,
      callback_url: "http://localhost:4000/api/v1/orders/payment-callback".to_string(),
      cancel_url: None,
    }
  }
}

/// The workflow engine. Cheap to clone; clones share the pool and providers.
#[derive(Clone)]
pub struct OrderWorkflow {
  pub(crate) pool: PgPool,
  pub(crate) fees: FeePolicy,
  pub(crate) verifier: Arc<dyn PaymentVerifier>,
  pub(crate) intents: Arc<dyn PaymentIntentCreator>,
  pub(crate) sessions: SessionConfig,
}

impl OrderWorkflow {
  pub fn new(
    pool: PgPool,
    fees: FeePolicy,
    verifier: Arc<dyn PaymentVerifier>,
    intents: Arc<dyn PaymentIntentCreator>,
    sessions: SessionConfig,
  ) -> Self {
    Self {
      pool,
      fees,
      verifier,
      intents,
      sessions,
    }
  }

  pub fn fee_policy(&self) -> &FeePolicy {
    &self.fees
  }

  /// The target statuses `role` may request from `status`. Pure passthrough
  /// to the state machine, exposed for UI affordances; enforcement happens in
  /// [`OrderWorkflow::update_order_status`] regardless of what a client shows.
  pub fn allowed_transitions(&self, status: OrderStatus, role: Role) -> Vec<OrderStatus> {
    state_machine::allowed_transitions(status, role)
  }

  /// Preconditions shared by order creation and payment preparation: the
  /// address belongs to the customer, the store exists and is approved, and
  /// the store is currently open.
  pub(crate) async fn storefront_checks(
    &self,
    customer_id: Uuid,
    store_id: Uuid,
    address_id: Uuid,
  ) -> Result<(Store, Address)> {
    let address = sqlx::query_as::<_, Address>(
      "SELECT id, user_id, full_address, city FROM addresses WHERE id = $1 AND user_id = $2",
    )
    .bind(address_id)
    .bind(customer_id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or(Error::AddressNotFound)?;

    let store = sqlx::query_as::<_, Store>(
      "SELECT id, owner_id, name, address, phone, is_approved, is_open, opening_time, closing_time \
       FROM stores WHERE id = $1 AND is_approved = TRUE",
    )
    .bind(store_id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or(Error::StoreNotFound)?;

    if !store_hours::accepts_orders(
      store.is_open,
      store.opening_time.as_deref(),
      store.closing_time.as_deref(),
      Local::now().time(),
    ) {
      return Err(Error::StoreClosed);
    }

    Ok((store, address))
  }

  /// Eagerly load the relations callers expect in the immediate response.
  pub(crate) async fn load_details(&self, order: Order) -> Result<OrderWithDetails> {
    let items = sqlx::query_as::<_, OrderItem>(
      "SELECT id, order_id, product_id, quantity, price FROM order_items WHERE order_id = $1",
    )
    .bind(order.id)
    .fetch_all(&self.pool)
    .await?;

    let store = sqlx::query_as::<_, Store>(
      "SELECT id, owner_id, name, address, phone, is_approved, is_open, opening_time, closing_time \
       FROM stores WHERE id = $1",
    )
    .bind(order.store_id)
    .fetch_one(&self.pool)
    .await?;

    let address = sqlx::query_as::<_, Address>("SELECT id, user_id, full_address, city FROM addresses WHERE id = $1")
      .bind(order.address_id)
      .fetch_one(&self.pool)
      .await?;

    Ok(OrderWithDetails {
      order,
      items,
      store,
      address,
    })
  }
}
