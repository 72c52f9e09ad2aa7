// sauda_server/src/config.rs

use crate::errors::{ApiError, Result};
use dotenvy::dotenv;
use rust_decimal::Decimal;
use sauda::{FeePolicy, SessionConfig};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  /// Public base URL of this service; the payment callback is built from it.
  pub backend_url: String,
  /// Where the provider sends customers who abort the payment.
  pub frontend_url: String,

  // Payment provider (XPay-style redirect gateway)
  pub xpay_api_key: Option<String>,
  pub xpay_account_id: Option<String>,
  pub xpay_secret: Option<String>,
  pub xpay_base_url: String,
  pub provider_timeout_secs: u64,

  // Fee policy
  pub commission_rate: Decimal,
  pub delivery_fee: Decimal,
  pub service_fee: Decimal,
  pub payment_session_ttl_minutes: i64,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| ApiError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let get_decimal = |var_name: &str, default: &str| -> Result<Decimal> {
      let raw = get_env(var_name).unwrap_or_else(|_| default.to_string());
      Decimal::from_str(&raw).map_err(|e| ApiError::Config(format!("Invalid {}: {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "4000".to_string())
      .parse::<u16>()
      .map_err(|e| ApiError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;
    let backend_url = get_env("BACKEND_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));
    let frontend_url = get_env("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let xpay_api_key = get_env("XPAY_API_KEY").ok();
    let xpay_account_id = get_env("XPAY_ACCOUNT_ID").ok();
    let xpay_secret = get_env("XPAY_SECRET").ok();
    let xpay_base_url = get_env("XPAY_BASE_URL").unwrap_or_else(|_| "https://xstak-pay-stg.xstak.com".to_string());
    let provider_timeout_secs = get_env("PROVIDER_TIMEOUT_SECS")
      .unwrap_or_else(|_| "15".to_string())
      .parse::<u64>()
      .map_err(|e| ApiError::Config(format!("Invalid PROVIDER_TIMEOUT_SECS: {}", e)))?;

    let commission_rate = get_decimal("COMMISSION_RATE", "0.15")?;
    let delivery_fee = get_decimal("DELIVERY_FEE", "150")?;
    let service_fee = get_decimal("SERVICE_FEE", "23.49")?;
    let payment_session_ttl_minutes = get_env("PAYMENT_SESSION_TTL_MINUTES")
      .unwrap_or_else(|_| "30".to_string())
      .parse::<i64>()
      .map_err(|e| ApiError::Config(format!("Invalid PAYMENT_SESSION_TTL_MINUTES: {}", e)))?;

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      backend_url,
      frontend_url,
      xpay_api_key,
      xpay_account_id,
      xpay_secret,
      xpay_base_url,
      provider_timeout_secs,
      commission_rate,
      delivery_fee,
      service_fee,
      payment_session_ttl_minutes,
    })
  }

  pub fn fee_policy(&self) -> FeePolicy {
    FeePolicy {
      commission_rate: self.commission_rate,
      delivery_fee: self.delivery_fee,
      service_fee: self.service_fee,
    }
  }

  pub fn session_config(&self) -> SessionConfig {
    SessionConfig {
      ttl_minutes: self.payment_session_ttl_minutes,
      callback_url: format!("{}/api/v1/orders/payment-callback", self.backend_url),
      cancel_url: Some(format!("{}/cart/checkout", self.frontend_url)),
    }
  }
}
