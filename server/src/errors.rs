// sauda_server/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use sauda::Error as EngineError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("Authentication required: {0}")]
  Unauthorized(String),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error(transparent)]
  Engine(#[from] EngineError),

  #[error("Internal server error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for ApiError {
  fn from(err: anyhow::Error) -> Self {
    ApiError::Internal(err.to_string())
  }
}

impl ResponseError for ApiError {
  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      ApiError::Unauthorized(m) => HttpResponse::Unauthorized().json(json!({"error": m})),
      ApiError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      ApiError::Internal(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "An internal error occurred", "detail": m}))
      }
      ApiError::Engine(e) => engine_error_response(e),
    }
  }
}

/// Map the engine's error taxonomy onto HTTP statuses: not-found (including
/// deliberate ownership masking) → 404, validation → 400, state conflicts →
/// 409, payment failures → 402, storage failures → opaque 500.
fn engine_error_response(e: &EngineError) -> HttpResponse {
  match e {
    EngineError::AddressNotFound
    | EngineError::StoreNotFound
    | EngineError::OrderNotFound
    | EngineError::ProductNotFound { .. }
    | EngineError::RiderNotFound
    | EngineError::PaymentMethodNotFound => HttpResponse::NotFound().json(json!({"error": e.to_string()})),

    EngineError::Validation(_) | EngineError::MissingRider | EngineError::MissingPaymentProof => {
      HttpResponse::BadRequest().json(json!({"error": e.to_string()}))
    }

    EngineError::StoreClosed | EngineError::InsufficientStock { .. } | EngineError::InvalidTransition { .. } => {
      HttpResponse::Conflict().json(json!({"error": e.to_string()}))
    }

    EngineError::PaymentNotConfirmed
    | EngineError::SessionInvalid
    | EngineError::SessionExpired
    | EngineError::Provider(_) => {
      HttpResponse::PaymentRequired().json(json!({"error": e.to_string(), "retryable": e.is_retryable()}))
    }

    EngineError::Database(_) | EngineError::Serialization(_) => {
      HttpResponse::InternalServerError().json(json!({"error": "Database operation failed"}))
    }
  }
}

// Define a Result type alias for the application
pub type Result<T, E = ApiError> = std::result::Result<T, E>;
