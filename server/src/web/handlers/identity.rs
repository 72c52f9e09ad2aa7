// sauda_server/src/web/handlers/identity.rs

//! Request identity extractor.
//!
//! Authentication itself lives upstream (a gateway terminates the session and
//! forwards the caller as trusted headers); this extractor only reads those
//! headers. Missing or malformed identity rejects the request before the
//! handler body runs.

use crate::errors::ApiError;
use actix_web::{FromRequest, HttpRequest};
use sauda::Role;
use std::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
pub struct Identity {
  pub user_id: Uuid,
  pub role: Role,
}

fn parse_role(raw: &str) -> Option<Role> {
  match raw.trim().to_ascii_uppercase().as_str() {
    "CUSTOMER" => Some(Role::Customer),
    "STORE_OWNER" => Some(Role::StoreOwner),
    "RIDER" => Some(Role::Rider),
    "ADMIN" => Some(Role::Admin),
    _ => None,
  }
}

fn header_str<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
  req.headers().get(name)?.to_str().ok()
}

impl FromRequest for Identity {
  type Error = ApiError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let user_id = header_str(req, "x-user-id").and_then(|raw| Uuid::parse_str(raw).ok());
    let role = header_str(req, "x-user-role").and_then(parse_role);

    match (user_id, role) {
      (Some(user_id), Some(role)) => ready(Ok(Identity { user_id, role })),
      _ => {
        warn!("request rejected: missing or invalid x-user-id / x-user-role headers");
        ready(Err(ApiError::Unauthorized(
          "Missing or invalid identity headers".to_string(),
        )))
      }
    }
  }
}
