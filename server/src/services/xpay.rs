// sauda_server/src/services/xpay.rs

//! XPay-style redirect payment gateway client.
//!
//! Implements both engine provider traits: intent creation (POST, api-key and
//! account-id headers, optional HMAC-SHA256 body signature) and payment
//! verification (GET by intent id). Every call is bounded by the configured
//! request timeout; a timeout or provider error reads as "not confirmed" on
//! the verification side and as a provider error on the creation side, so the
//! engine always fails closed.

use crate::config::AppConfig;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sauda::payments::{CreatedIntent, IntentRequest, PaymentIntentCreator, PaymentVerification, PaymentVerifier};
use sauda::Error as EngineError;
use serde_json::{json, Value};
use sha2::Sha256;
use std::time::Duration;
use tracing::{info, warn};

type HmacSha256 = Hmac<Sha256>;

pub struct XPayClient {
  http: reqwest::Client,
  api_key: String,
  account_id: String,
  secret: Option<String>,
  base_url: String,
}

impl XPayClient {
  /// `None` when the provider credentials are absent; the caller should fall
  /// back to [`CardPaymentsUnavailable`].
  pub fn from_config(config: &AppConfig) -> Option<Self> {
    let api_key = config.xpay_api_key.clone()?;
    let account_id = config.xpay_account_id.clone()?;
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.provider_timeout_secs))
      .build()
      .ok()?;
    Some(Self {
      http,
      api_key,
      account_id,
      secret: config.xpay_secret.clone(),
      base_url: config.xpay_base_url.clone(),
    })
  }

  fn signature(&self, payload: &str) -> Option<String> {
    let secret = self.secret.as_ref()?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
  }
}

/// Local numbers come in as "03xx..."; the gateway wants country-prefixed
/// digits.
fn normalize_phone(phone: &str) -> String {
  let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
  match digits.strip_prefix('0') {
    Some(rest) => format!("92{rest}"),
    None => digits,
  }
}

#[async_trait]
impl PaymentIntentCreator for XPayClient {
  async fn create_intent(&self, request: IntentRequest) -> Result<CreatedIntent, EngineError> {
    let body = json!({
      "amount": request.amount.round().to_i64().unwrap_or(0),
      "currency": "PKR",
      "payment_method_types": "card",
      "customer": {
        "name": request.customer.name,
        "email": request.customer.email.clone().unwrap_or_default(),
        "phone": normalize_phone(&request.customer.phone),
      },
      "shipping": {
        "address1": request.shipping_address.clone().unwrap_or_default(),
        "city": request.shipping_city.clone().unwrap_or_else(|| "Lahore".to_string()),
        "country": "Pakistan",
      },
      "metadata": { "order_reference": request.order_reference },
      "callback_url": request.callback_url,
      "cancel_url": request.cancel_url,
    });
    let payload = body.to_string();

    let mut http_request = self
      .http
      .post(format!("{}/public/v1/payment/intent", self.base_url))
      .header("Content-Type", "application/json")
      .header("x-api-key", &self.api_key)
      .header("x-account-id", &self.account_id);
    if let Some(signature) = self.signature(&payload) {
      http_request = http_request.header("x-signature", signature);
    }

    let response = http_request
      .body(payload)
      .send()
      .await
      .map_err(|e| EngineError::Provider(format!("payment provider unreachable: {e}")))?;

    let status = response.status();
    let data: Value = response.json().await.unwrap_or_else(|_| json!({}));

    if !status.is_success() {
      let message = data
        .get("message")
        .or_else(|| data.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("payment provider error: {status}"));
      warn!(%status, "intent creation rejected by provider");
      return Err(EngineError::Provider(message));
    }

    let pick = |keys: &[&str]| -> Option<String> {
      keys
        .iter()
        .find_map(|k| data.get(*k).and_then(Value::as_str))
        .map(str::to_string)
    };
    let intent_id = pick(&["id", "payment_intent_id", "paymentIntentId"])
      .ok_or_else(|| EngineError::Provider("provider response missing intent id".to_string()))?;

    info!(%intent_id, "payment intent created");
    Ok(CreatedIntent {
      intent_id,
      client_secret: pick(&["client_secret", "clientSecret"]),
      encryption_key: pick(&["encryption_key", "encryptionKey"]),
      redirect_url: pick(&["redirect_url", "fwdUrl", "url"]),
    })
  }
}

#[async_trait]
impl PaymentVerifier for XPayClient {
  async fn verify(&self, reference: &str) -> Option<PaymentVerification> {
    let response = self
      .http
      .get(format!("{}/public/v1/payment/intent/{}", self.base_url, reference))
      .header("x-api-key", &self.api_key)
      .header("x-account-id", &self.account_id)
      .send()
      .await
      .ok()?;

    if !response.status().is_success() {
      warn!(status = %response.status(), "payment verification rejected by provider");
      return None;
    }
    let data: Value = response.json().await.ok()?;

    let status = data
      .get("status")
      .or_else(|| data.get("payment_status"))
      .and_then(Value::as_str)
      .unwrap_or("unknown")
      .to_string();
    let amount = data
      .get("amount")
      .or_else(|| data.get("amount_pkr"))
      .and_then(Value::as_f64)
      .and_then(Decimal::from_f64);

    Some(PaymentVerification { status, amount })
  }
}

/// Stand-in provider used when no gateway credentials are configured: card
/// payments simply are not available, while COD ordering keeps working.
pub struct CardPaymentsUnavailable;

#[async_trait]
impl PaymentIntentCreator for CardPaymentsUnavailable {
  async fn create_intent(&self, _request: IntentRequest) -> Result<CreatedIntent, EngineError> {
    Err(EngineError::Provider("Card payments are not available".to_string()))
  }
}

#[async_trait]
impl PaymentVerifier for CardPaymentsUnavailable {
  async fn verify(&self, _reference: &str) -> Option<PaymentVerification> {
    None
  }
}
