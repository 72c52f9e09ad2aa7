// sauda_core/src/payments.rs

//! Contracts for the external payment provider.
//!
//! The engine never talks to a gateway directly; it consumes two capabilities,
//! implemented elsewhere (an HTTP client in production, mocks in tests):
//! verification of an already-made payment, and creation of a redirect-based
//! payment intent. Provider failures fail closed: an error or timeout reads
//! as "not confirmed", never as success.

use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Provider statuses accepted as proof of a captured payment.
const CONFIRMED_STATUSES: [&str; 4] = ["succeeded", "paid", "completed", "captured"];

/// What the provider reports for a payment reference.
#[derive(Debug, Clone)]
pub struct PaymentVerification {
  pub status: String,
  pub amount: Option<Decimal>,
}

impl PaymentVerification {
  /// Case-insensitive check against the accepted status set.
  pub fn is_confirmed(&self) -> bool {
    let status = self.status.to_lowercase();
    CONFIRMED_STATUSES.iter().any(|s| *s == status)
  }
}

/// Looks up the state of a payment by its provider reference. `None` means
/// the provider could not confirm it (unknown reference, provider error, or
/// timeout) and must be treated as not paid.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
  async fn verify(&self, reference: &str) -> Option<PaymentVerification>;
}

/// Customer contact details forwarded to the provider with an intent.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerContact {
  pub name: String,
  pub email: Option<String>,
  pub phone: String,
}

/// Everything the provider needs to open a redirect-based payment.
#[derive(Debug, Clone, Serialize)]
pub struct IntentRequest {
  pub amount: Decimal,
  pub customer: CustomerContact,
  /// Our pending-payment id; comes back on the provider's callback.
  pub order_reference: Uuid,
  pub callback_url: String,
  pub cancel_url: Option<String>,
  pub shipping_address: Option<String>,
  pub shipping_city: Option<String>,
}

/// Handle returned by a successful intent creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedIntent {
  pub intent_id: String,
  pub redirect_url: Option<String>,
  pub client_secret: Option<String>,
  pub encryption_key: Option<String>,
}

/// Opens a payment intent with the provider. Failures surface as
/// [`crate::Error::Provider`] so the caller can expire the pending payment
/// and report the provider's message.
#[async_trait]
pub trait PaymentIntentCreator: Send + Sync {
  async fn create_intent(&self, request: IntentRequest) -> Result<CreatedIntent>;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn confirmation_is_case_insensitive() {
    for status in ["succeeded", "PAID", "Completed", "CAPTURED"] {
      let v = PaymentVerification {
        status: status.to_string(),
        amount: None,
      };
      assert!(v.is_confirmed(), "{status} should confirm");
    }
  }

  #[test]
  fn anything_else_is_not_confirmed() {
    for status in ["requires_action", "failed", "pending", "", "unknown"] {
      let v = PaymentVerification {
        status: status.to_string(),
        amount: None,
      };
      assert!(!v.is_confirmed(), "{status} must not confirm");
    }
  }
}
