// sauda_core/src/models/cart.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line of a submitted cart: the product, how many, and the unit price the
/// client saw at cart time. That client price becomes the order's immutable
/// price snapshot; the engine does not re-price from the live catalog. The
/// snapshot source is isolated here so the policy can change in one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
  pub product_id: Uuid,
  pub quantity: i32,
  pub price: Decimal,
}
