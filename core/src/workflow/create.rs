// sauda_core/src/workflow/create.rs

//! Order creation: precondition checks, stock decrement under row locks,
//! payment-proof verification for card orders, and the atomic insert of the
//! order with its items, initial history row, and store earning.

use crate::error::{Error, Result};
use crate::models::{
  Address, CartLine, Order, OrderItem, OrderWithDetails, PaymentMethod, PaymentStatus, Product, Store,
};
use crate::state_machine::OrderStatus;
use crate::workflow::OrderWorkflow;
use sqlx::{Postgres, Transaction};
use std::collections::HashMap;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Proof that a card order has been (or can be) paid. Exactly one is required
/// when the payment method is CARD.
#[derive(Debug, Clone)]
pub enum PaymentProof {
  /// A provider payment-intent reference, verified as captured with the
  /// payment verifier before the order commits.
  ProviderIntent(String),
  /// A saved payment method owned by the customer.
  SavedMethod(Uuid),
}

/// Everything a customer submits to place an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub store_id: Uuid,
  pub address_id: Uuid,
  pub items: Vec<CartLine>,
  pub payment_method: PaymentMethod,
  pub payment_proof: Option<PaymentProof>,
  pub notes: Option<String>,
}

/// Every line must resolve to a fetched product with enough stock.
fn check_lines(products: &[Product], items: &[CartLine]) -> Result<()> {
  let by_id: HashMap<Uuid, &Product> = products.iter().map(|p| (p.id, p)).collect();
  for line in items {
    let product = by_id
      .get(&line.product_id)
      .ok_or(Error::ProductNotFound { product_id: line.product_id })?;
    if product.is_out_of_stock || product.stock < i64::from(line.quantity) {
      warn!(product_id = %product.id, available = product.stock, "insufficient stock");
      return Err(Error::InsufficientStock {
        name: product.name.clone(),
        available: product.stock,
      });
    }
  }
  Ok(())
}

impl OrderWorkflow {
  /// Place an order.
  ///
  /// Preconditions, each a distinct failure, checked in order: address
  /// ownership, approved store, store open, per-item stock, card payment
  /// proof. All writes happen in one transaction; any failure aborts the
  /// whole thing, so there is never a partial stock decrement or an orphan
  /// order.
  #[instrument(skip(self, order), fields(customer_id = %customer_id, store_id = %order.store_id))]
  pub async fn create_order(&self, customer_id: Uuid, order: NewOrder) -> Result<OrderWithDetails> {
    let (store, address) = self.storefront_checks(customer_id, order.store_id, order.address_id).await?;

    let mut tx = self.pool.begin().await?;
    let created = self.create_order_in_tx(&mut tx, customer_id, &store, &address, order).await?;
    tx.commit().await?;

    info!(order_id = %created.order.id, total = %created.order.total_amount, "order created");
    Ok(created)
  }

  /// The transactional body of order creation, also reused by card-payment
  /// reconciliation so the order and the session completion commit together.
  /// The caller has already run [`OrderWorkflow::storefront_checks`].
  pub(crate) async fn create_order_in_tx(
    &self,
    tx: &mut Transaction<'_, Postgres>,
    customer_id: Uuid,
    store: &Store,
    address: &Address,
    order: NewOrder,
  ) -> Result<OrderWithDetails> {
    let totals = self.fees.quote(&order.items)?;

    let product_ids: Vec<Uuid> = order.items.iter().map(|i| i.product_id).collect();

    // First pass without locks: catch missing products and stock shortfalls
    // before any provider round-trip.
    let products = sqlx::query_as::<_, Product>(
      "SELECT id, store_id, name, price, stock, is_out_of_stock FROM products \
       WHERE id = ANY($1) AND store_id = $2",
    )
    .bind(&product_ids)
    .bind(order.store_id)
    .fetch_all(&mut **tx)
    .await?;
    check_lines(&products, &order.items)?;

    // Verify the card proof while no product rows are locked; the provider
    // call may run up to its timeout and must not stall concurrent orders
    // touching the same products.
    let payment_status = match order.payment_method {
      PaymentMethod::Card => {
        self.verify_card_proof(tx, customer_id, order.payment_proof.as_ref()).await?;
        PaymentStatus::Paid
      }
      PaymentMethod::Cod => PaymentStatus::Pending,
    };

    // Now lock the product rows and re-check. Concurrent orders against the
    // same products queue here, which is what makes the stock check
    // authoritative; stock may have moved during verification.
    let products = sqlx::query_as::<_, Product>(
      "SELECT id, store_id, name, price, stock, is_out_of_stock FROM products \
       WHERE id = ANY($1) AND store_id = $2 FOR UPDATE",
    )
    .bind(&product_ids)
    .bind(order.store_id)
    .fetch_all(&mut **tx)
    .await?;
    check_lines(&products, &order.items)?;

    for line in &order.items {
      sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2")
        .bind(i64::from(line.quantity))
        .bind(line.product_id)
        .execute(&mut **tx)
        .await?;
    }
    // Catch-all consistency sweep: flag anything that has hit zero, not just
    // the products on this order.
    sqlx::query("UPDATE products SET is_out_of_stock = TRUE WHERE stock <= 0 AND is_out_of_stock = FALSE")
      .execute(&mut **tx)
      .await?;

    let created = sqlx::query_as::<_, Order>(
      "INSERT INTO orders \
         (customer_id, store_id, address_id, subtotal_amount, delivery_fee, service_fee, \
          commission_amount, total_amount, payment_method, payment_status, order_status, notes) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
       RETURNING id, customer_id, store_id, address_id, rider_id, subtotal_amount, delivery_fee, \
                 service_fee, commission_amount, total_amount, payment_method, payment_status, \
                 order_status, cancellation_reason, cancelled_by_role, notes, created_at, updated_at",
    )
    .bind(customer_id)
    .bind(order.store_id)
    .bind(order.address_id)
    .bind(totals.subtotal)
    .bind(totals.delivery_fee)
    .bind(totals.service_fee)
    .bind(totals.commission)
    .bind(totals.total)
    .bind(order.payment_method)
    .bind(payment_status)
    .bind(OrderStatus::Pending)
    .bind(order.notes.as_deref())
    .fetch_one(&mut **tx)
    .await?;

    let mut items = Vec::with_capacity(order.items.len());
    for line in &order.items {
      let item = sqlx::query_as::<_, OrderItem>(
        "INSERT INTO order_items (order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4) \
         RETURNING id, order_id, product_id, quantity, price",
      )
      .bind(created.id)
      .bind(line.product_id)
      .bind(line.quantity)
      .bind(line.price)
      .fetch_one(&mut **tx)
      .await?;
      items.push(item);
    }

    sqlx::query("INSERT INTO order_status_history (order_id, status, changed_by_user_id) VALUES ($1, $2, $3)")
      .bind(created.id)
      .bind(OrderStatus::Pending)
      .bind(customer_id)
      .execute(&mut **tx)
      .await?;

    sqlx::query(
      "INSERT INTO store_earnings (store_id, order_id, store_amount, commission_amount) VALUES ($1, $2, $3, $4)",
    )
    .bind(order.store_id)
    .bind(created.id)
    .bind(totals.store_amount)
    .bind(totals.commission)
    .execute(&mut **tx)
    .await?;

    Ok(OrderWithDetails {
      order: created,
      items,
      store: store.clone(),
      address: address.clone(),
    })
  }

  /// A card order needs exactly one acceptable proof: a provider intent the
  /// verifier confirms as captured, or a saved payment method owned by the
  /// customer.
  async fn verify_card_proof(
    &self,
    tx: &mut Transaction<'_, Postgres>,
    customer_id: Uuid,
    proof: Option<&PaymentProof>,
  ) -> Result<()> {
    match proof {
      Some(PaymentProof::ProviderIntent(reference)) => {
        let confirmed = self
          .verifier
          .verify(reference)
          .await
          .map(|v| v.is_confirmed())
          .unwrap_or(false);
        if !confirmed {
          warn!(reference, "card payment not confirmed by provider");
          return Err(Error::PaymentNotConfirmed);
        }
        Ok(())
      }
      Some(PaymentProof::SavedMethod(method_id)) => {
        let found = sqlx::query_scalar::<_, i64>(
          "SELECT COUNT(*) FROM saved_payment_methods WHERE id = $1 AND user_id = $2",
        )
        .bind(method_id)
        .bind(customer_id)
        .fetch_one(&mut **tx)
        .await?;
        if found == 0 {
          return Err(Error::PaymentMethodNotFound);
        }
        Ok(())
      }
      None => Err(Error::MissingPaymentProof),
    }
  }
}
