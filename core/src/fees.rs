// sauda_core/src/fees.rs

//! Fee and commission arithmetic.
//!
//! All money flows through [`rust_decimal::Decimal`]; nothing here rounds.
//! Display formatting is the caller's problem. The constants are a policy,
//! injected once at engine construction, so tests and deployments can tune
//! them without touching call sites.

use crate::error::{Error, Result};
use crate::models::CartLine;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

/// Platform fee policy: the commission rate taken from the store's subtotal
/// plus the fixed per-order delivery and service fees charged to the customer.
#[derive(Debug, Clone)]
pub struct FeePolicy {
  pub commission_rate: Decimal,
  pub delivery_fee: Decimal,
  pub service_fee: Decimal,
}

impl Default for FeePolicy {
  fn default() -> Self {
    Self {
      commission_rate: dec!(0.15),
      delivery_fee: dec!(150),
      service_fee: dec!(23.49),
    }
  }
}

/// The amounts derived from one order's line items.
///
/// Identities: `total == subtotal + delivery_fee + service_fee` and
/// `commission + store_amount == subtotal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
  pub subtotal: Decimal,
  pub commission: Decimal,
  pub store_amount: Decimal,
  pub delivery_fee: Decimal,
  pub service_fee: Decimal,
  pub total: Decimal,
}

impl FeePolicy {
  /// Compute the totals for a list of cart lines.
  ///
  /// Deterministic; the only failures are an empty list, a quantity below 1,
  /// or a negative unit price.
  pub fn quote(&self, items: &[CartLine]) -> Result<OrderTotals> {
    if items.is_empty() {
      return Err(Error::Validation("order must contain at least one item".into()));
    }

    let mut subtotal = Decimal::ZERO;
    for line in items {
      if line.quantity < 1 {
        return Err(Error::Validation(format!(
          "quantity for product {} must be at least 1",
          line.product_id
        )));
      }
      if line.price.is_sign_negative() {
        return Err(Error::Validation(format!(
          "price for product {} must not be negative",
          line.product_id
        )));
      }
      subtotal += line.price * Decimal::from(line.quantity);
    }

    let commission = subtotal * self.commission_rate;
    Ok(OrderTotals {
      subtotal,
      commission,
      store_amount: subtotal - commission,
      delivery_fee: self.delivery_fee,
      service_fee: self.service_fee,
      total: subtotal + self.delivery_fee + self.service_fee,
    })
  }
}
