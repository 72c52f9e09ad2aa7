// sauda_core/src/workflow/sessions.rs

//! Redirect-based card payment sessions.
//!
//! Preparation writes a time-boxed pending payment and asks the provider for
//! a redirect handle. Completion reconciles the provider's confirmation back
//! into a real order. Completion is the failure-prone path: provider
//! timeouts, double callbacks, and expiry all land here, so the pending row
//! is locked and the order creation and the COMPLETED flip commit in the same
//! transaction. One pending payment can never yield two orders.

use crate::error::{Error, Result};
use crate::models::{CartLine, OrderWithDetails, PaymentMethod, PendingPayment, PendingPaymentStatus};
use crate::payments::{CustomerContact, IntentRequest};
use crate::workflow::{NewOrder, OrderWorkflow, PaymentProof};
use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// A card checkout submission: where to deliver, what to buy.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
  pub store_id: Uuid,
  pub address_id: Uuid,
  pub items: Vec<CartLine>,
}

/// What the client needs to hand the customer over to the provider.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PaymentRedirect {
  pub pending_id: Uuid,
  pub intent_id: String,
  pub redirect_url: Option<String>,
  pub client_secret: Option<String>,
  pub encryption_key: Option<String>,
}

impl OrderWorkflow {
  /// Open a card payment session: validate the storefront exactly as order
  /// creation does, quote the total, record a pending payment with a TTL, and
  /// obtain a redirect handle from the provider. Provider failure expires the
  /// session immediately and surfaces the provider's message.
  #[instrument(skip(self, request), fields(customer_id = %customer_id, store_id = %request.store_id))]
  pub async fn prepare_card_payment(&self, customer_id: Uuid, request: PaymentRequest) -> Result<PaymentRedirect> {
    let (_, address) = self
      .storefront_checks(customer_id, request.store_id, request.address_id)
      .await?;
    let totals = self.fees.quote(&request.items)?;

    let (name, email, phone) =
      sqlx::query_as::<_, (String, Option<String>, String)>("SELECT name, email, phone FROM users WHERE id = $1")
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await?;

    let expires_at = Utc::now() + Duration::minutes(self.sessions.ttl_minutes);
    let pending = sqlx::query_as::<_, PendingPayment>(
      "INSERT INTO pending_payments (customer_id, store_id, address_id, items_json, amount, status, expires_at) \
       VALUES ($1, $2, $3, $4, $5, 'PENDING', $6) \
       RETURNING id, customer_id, store_id, address_id, items_json, amount, status, provider_intent_id, \
                 expires_at, created_at",
    )
    .bind(customer_id)
    .bind(request.store_id)
    .bind(request.address_id)
    .bind(serde_json::to_value(&request.items)?)
    .bind(totals.total)
    .bind(expires_at)
    .fetch_one(&self.pool)
    .await?;

    let intent_request = IntentRequest {
      amount: totals.total,
      customer: CustomerContact { name, email, phone },
      order_reference: pending.id,
      callback_url: format!("{}?pending_id={}", self.sessions.callback_url, pending.id),
      cancel_url: self.sessions.cancel_url.clone(),
      shipping_address: Some(address.full_address),
      shipping_city: Some(address.city),
    };

    let intent = match self.intents.create_intent(intent_request).await {
      Ok(intent) => intent,
      Err(e) => {
        warn!(pending_id = %pending.id, error = %e, "provider intent creation failed; expiring session");
        sqlx::query("UPDATE pending_payments SET status = 'EXPIRED' WHERE id = $1")
          .bind(pending.id)
          .execute(&self.pool)
          .await?;
        return Err(e);
      }
    };

    sqlx::query("UPDATE pending_payments SET provider_intent_id = $2 WHERE id = $1")
      .bind(pending.id)
      .bind(&intent.intent_id)
      .execute(&self.pool)
      .await?;

    info!(pending_id = %pending.id, intent_id = %intent.intent_id, "card payment session opened");
    Ok(PaymentRedirect {
      pending_id: pending.id,
      intent_id: intent.intent_id,
      redirect_url: intent.redirect_url,
      client_secret: intent.client_secret,
      encryption_key: intent.encryption_key,
    })
  }

  /// Reconcile a provider confirmation into an order.
  ///
  /// The pending row is locked and must still be PENDING; a second callback
  /// for an already-COMPLETED session fails here without touching anything.
  /// Past the TTL the session is marked EXPIRED and the call fails. An
  /// unconfirmed payment leaves the row PENDING so the caller may retry
  /// within the TTL. On confirmation the order is created through the same
  /// transactional path as direct order creation, and the COMPLETED flip
  /// commits with it.
  #[instrument(skip(self), fields(pending_id = %pending_id))]
  pub async fn complete_card_payment(&self, pending_id: Uuid, provider_intent_id: &str) -> Result<OrderWithDetails> {
    let mut tx = self.pool.begin().await?;

    let pending = sqlx::query_as::<_, PendingPayment>(
      "SELECT id, customer_id, store_id, address_id, items_json, amount, status, provider_intent_id, \
              expires_at, created_at \
       FROM pending_payments WHERE id = $1 FOR UPDATE",
    )
    .bind(pending_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(Error::SessionInvalid)?;

    if pending.status != PendingPaymentStatus::Pending {
      return Err(Error::SessionInvalid);
    }

    if Utc::now() > pending.expires_at {
      sqlx::query("UPDATE pending_payments SET status = 'EXPIRED' WHERE id = $1")
        .bind(pending_id)
        .execute(&mut *tx)
        .await?;
      tx.commit().await?;
      warn!("payment session expired before reconciliation");
      return Err(Error::SessionExpired);
    }

    let confirmed = self
      .verifier
      .verify(provider_intent_id)
      .await
      .map(|v| v.is_confirmed())
      .unwrap_or(false);
    if !confirmed {
      // Roll back; the session stays PENDING and retryable within the TTL.
      return Err(Error::PaymentNotConfirmed);
    }

    let items: Vec<CartLine> = serde_json::from_value(pending.items_json.clone())?;
    let (store, address) = self
      .storefront_checks(pending.customer_id, pending.store_id, pending.address_id)
      .await?;

    let order = self
      .create_order_in_tx(
        &mut tx,
        pending.customer_id,
        &store,
        &address,
        NewOrder {
          store_id: pending.store_id,
          address_id: pending.address_id,
          items,
          payment_method: PaymentMethod::Card,
          payment_proof: Some(PaymentProof::ProviderIntent(provider_intent_id.to_string())),
          notes: None,
        },
      )
      .await?;

    sqlx::query("UPDATE pending_payments SET status = 'COMPLETED', provider_intent_id = $2 WHERE id = $1")
      .bind(pending_id)
      .bind(provider_intent_id)
      .execute(&mut *tx)
      .await?;

    tx.commit().await?;
    info!(order_id = %order.order.id, "card payment reconciled into order");
    Ok(order)
  }
}
