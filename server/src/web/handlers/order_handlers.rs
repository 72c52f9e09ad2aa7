// sauda_server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use sauda::{
  CancellationReason, CartLine, NewOrder, OrderStatus, PaymentMethod, PaymentProof, PaymentRequest, Role, StatusChange,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::errors::{ApiError, Result};
use crate::state::AppState;
use crate::web::handlers::Identity;

fn require_customer(identity: &Identity) -> Result<()> {
  if identity.role != Role::Customer {
    return Err(ApiError::Unauthorized("Only customers can place orders".to_string()));
  }
  Ok(())
}

// --- Request DTOs ---

#[derive(Debug, Deserialize)]
pub struct CreateOrderPayload {
  pub store_id: Uuid,
  pub address_id: Uuid,
  pub items: Vec<CartLine>,
  pub payment_method: PaymentMethod,
  /// Provider intent reference for an already-made card payment. Takes
  /// precedence over `payment_method_id` when both are supplied.
  pub payment_intent_id: Option<String>,
  pub payment_method_id: Option<Uuid>,
  pub notes: Option<String>,
}

impl CreateOrderPayload {
  fn payment_proof(&self) -> Option<PaymentProof> {
    if let Some(intent_id) = &self.payment_intent_id {
      return Some(PaymentProof::ProviderIntent(intent_id.clone()));
    }
    self.payment_method_id.map(PaymentProof::SavedMethod)
  }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusPayload {
  pub status: OrderStatus,
  pub rider_id: Option<Uuid>,
  pub cancellation_reason: Option<CancellationReason>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionsQuery {
  pub status: OrderStatus,
  /// Defaults to the caller's own role.
  pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct PrepareCardPaymentPayload {
  pub store_id: Uuid,
  pub address_id: Uuid,
  pub items: Vec<CartLine>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentCallbackQuery {
  pub pending_id: Uuid,
  #[serde(alias = "payment_intent_id", alias = "pi_id")]
  pub intent_id: Option<String>,
}

// --- Handlers ---

#[instrument(skip(state, payload), fields(user_id = %identity.user_id))]
pub async fn create_order_handler(
  state: web::Data<AppState>,
  identity: Identity,
  payload: web::Json<CreateOrderPayload>,
) -> Result<HttpResponse> {
  require_customer(&identity)?;
  let payload = payload.into_inner();

  let order = NewOrder {
    store_id: payload.store_id,
    address_id: payload.address_id,
    payment_proof: payload.payment_proof(),
    items: payload.items,
    payment_method: payload.payment_method,
    notes: payload.notes,
  };
  let created = state.workflow.create_order(identity.user_id, order).await?;

  Ok(HttpResponse::Created().json(created))
}

#[instrument(skip(state), fields(user_id = %identity.user_id))]
pub async fn allowed_transitions_handler(
  state: web::Data<AppState>,
  identity: Identity,
  query: web::Query<TransitionsQuery>,
) -> Result<HttpResponse> {
  let role = query.role.unwrap_or(identity.role);
  let allowed = state.workflow.allowed_transitions(query.status, role);

  Ok(HttpResponse::Ok().json(json!({
    "status": query.status,
    "role": role,
    "allowed": allowed,
  })))
}

#[instrument(skip(state, payload), fields(user_id = %identity.user_id))]
pub async fn prepare_card_payment_handler(
  state: web::Data<AppState>,
  identity: Identity,
  payload: web::Json<PrepareCardPaymentPayload>,
) -> Result<HttpResponse> {
  require_customer(&identity)?;
  let payload = payload.into_inner();

  let redirect = state
    .workflow
    .prepare_card_payment(
      identity.user_id,
      PaymentRequest {
        store_id: payload.store_id,
        address_id: payload.address_id,
        items: payload.items,
      },
    )
    .await?;

  Ok(HttpResponse::Ok().json(redirect))
}

/// Landing point for the provider's browser redirect after payment. Always
/// answers with a redirect back to the storefront, success or not, because
/// the audience is a customer's browser rather than an API client.
#[instrument(skip(state))]
pub async fn payment_callback_handler(
  state: web::Data<AppState>,
  query: web::Query<PaymentCallbackQuery>,
) -> Result<HttpResponse> {
  let query = query.into_inner();
  let frontend = &state.config.frontend_url;

  let Some(intent_id) = query.intent_id else {
    warn!(pending_id = %query.pending_id, "payment callback without an intent reference");
    return Ok(redirect_to(format!("{frontend}/cart/checkout?payment=failed")));
  };

  match state.workflow.complete_card_payment(query.pending_id, &intent_id).await {
    Ok(details) => Ok(redirect_to(format!(
      "{frontend}/orders/{}?payment=success",
      details.order.id
    ))),
    Err(e) => {
      warn!(pending_id = %query.pending_id, error = %e, "card payment completion failed");
      Ok(redirect_to(format!("{frontend}/cart/checkout?payment=failed")))
    }
  }
}

#[instrument(skip(state, payload), fields(user_id = %identity.user_id, role = identity.role.as_str()))]
pub async fn update_order_status_handler(
  state: web::Data<AppState>,
  identity: Identity,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateStatusPayload>,
) -> Result<HttpResponse> {
  let payload = payload.into_inner();

  let updated = state
    .workflow
    .update_order_status(
      path.into_inner(),
      identity.user_id,
      identity.role,
      StatusChange {
        status: payload.status,
        rider_id: payload.rider_id,
        cancellation_reason: payload.cancellation_reason,
      },
    )
    .await?;

  Ok(HttpResponse::Ok().json(updated))
}

fn redirect_to(url: String) -> HttpResponse {
  HttpResponse::Found().insert_header(("Location", url)).finish()
}
