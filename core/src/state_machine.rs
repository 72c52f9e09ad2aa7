// sauda_core/src/state_machine.rs

//! Pure, side-effect-free order status state machine.
//!
//! Given a current status, a requested target status, and the acting role,
//! decide whether the transition is legal. The workflow engine enforces this
//! table on every status update; UIs may additionally call
//! [`allowed_transitions`] to drive their affordances, but the table here is
//! authoritative regardless of what any client shows.

use serde::{Deserialize, Serialize};

/// Lifecycle states of an order. DELIVERED, CANCELLED, and STORE_REJECTED are
/// terminal (STORE_REJECTED with the admin-cancel caveat noted on
/// [`can_transition`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
  #[sqlx(rename = "PENDING")]
  Pending,
  #[sqlx(rename = "STORE_ACCEPTED")]
  StoreAccepted,
  #[sqlx(rename = "STORE_REJECTED")]
  StoreRejected,
  #[sqlx(rename = "READY_FOR_PICKUP")]
  ReadyForPickup,
  #[sqlx(rename = "RIDER_ASSIGNED")]
  RiderAssigned,
  #[sqlx(rename = "RIDER_ACCEPTED")]
  RiderAccepted,
  #[sqlx(rename = "PICKED_UP")]
  PickedUp,
  #[sqlx(rename = "DELIVERED")]
  Delivered,
  #[sqlx(rename = "CANCELLED")]
  Cancelled,
}

/// Actor roles on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  #[sqlx(rename = "CUSTOMER")]
  Customer,
  #[sqlx(rename = "STORE_OWNER")]
  StoreOwner,
  #[sqlx(rename = "RIDER")]
  Rider,
  #[sqlx(rename = "ADMIN")]
  Admin,
}

impl OrderStatus {
  /// Every status, in lifecycle order. Used for exhaustive table checks.
  pub const ALL: [OrderStatus; 9] = [
    OrderStatus::Pending,
    OrderStatus::StoreAccepted,
    OrderStatus::StoreRejected,
    OrderStatus::ReadyForPickup,
    OrderStatus::RiderAssigned,
    OrderStatus::RiderAccepted,
    OrderStatus::PickedUp,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
  ];

  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::StoreRejected
    )
  }

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "PENDING",
      OrderStatus::StoreAccepted => "STORE_ACCEPTED",
      OrderStatus::StoreRejected => "STORE_REJECTED",
      OrderStatus::ReadyForPickup => "READY_FOR_PICKUP",
      OrderStatus::RiderAssigned => "RIDER_ASSIGNED",
      OrderStatus::RiderAccepted => "RIDER_ACCEPTED",
      OrderStatus::PickedUp => "PICKED_UP",
      OrderStatus::Delivered => "DELIVERED",
      OrderStatus::Cancelled => "CANCELLED",
    }
  }
}

impl std::fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl Role {
  pub const ALL: [Role; 4] = [Role::Customer, Role::StoreOwner, Role::Rider, Role::Admin];

  pub fn as_str(self) -> &'static str {
    match self {
      Role::Customer => "CUSTOMER",
      Role::StoreOwner => "STORE_OWNER",
      Role::Rider => "RIDER",
      Role::Admin => "ADMIN",
    }
  }
}

impl std::fmt::Display for Role {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Transition table: for a (current status, role) pair, the statuses that role
/// may move the order to. Exhaustive over both enums so adding a status or a
/// role forces this table to be revisited.
fn table(from: OrderStatus, role: Role) -> &'static [OrderStatus] {
  use OrderStatus::*;
  use Role::*;
  match from {
    Pending => match role {
      Customer => &[Cancelled],
      StoreOwner => &[StoreAccepted, StoreRejected],
      Rider | Admin => &[],
    },
    StoreAccepted => match role {
      StoreOwner => &[ReadyForPickup],
      Customer | Rider | Admin => &[],
    },
    ReadyForPickup => match role {
      Admin => &[RiderAssigned],
      Customer | StoreOwner | Rider => &[],
    },
    RiderAssigned => match role {
      // A rider may accept the assignment or bounce it back to the pickup queue.
      Rider => &[RiderAccepted, ReadyForPickup],
      Customer | StoreOwner | Admin => &[],
    },
    RiderAccepted => match role {
      Rider => &[PickedUp],
      Customer | StoreOwner | Admin => &[],
    },
    PickedUp => match role {
      Rider => &[Delivered],
      Customer | StoreOwner | Admin => &[],
    },
    StoreRejected | Delivered | Cancelled => &[],
  }
}

/// Statuses from which an admin may force-cancel. STORE_REJECTED is included
/// even though it is otherwise terminal; that matches observed platform
/// behavior and is kept until policy says otherwise.
const CANCELABLE_BY_ADMIN: [OrderStatus; 7] = [
  OrderStatus::Pending,
  OrderStatus::StoreAccepted,
  OrderStatus::StoreRejected,
  OrderStatus::ReadyForPickup,
  OrderStatus::RiderAssigned,
  OrderStatus::RiderAccepted,
  OrderStatus::PickedUp,
];

/// May `role` move an order from `from` to `to`?
///
/// The admin force-cancel rule supersedes the table: an admin may cancel from
/// any status in [`CANCELABLE_BY_ADMIN`]. Every other combination must appear
/// in the table or it is rejected.
pub fn can_transition(from: OrderStatus, to: OrderStatus, role: Role) -> bool {
  if to == OrderStatus::Cancelled && role == Role::Admin {
    return CANCELABLE_BY_ADMIN.contains(&from);
  }
  table(from, role).contains(&to)
}

/// The full set of target statuses `role` may request from `from`.
pub fn allowed_transitions(from: OrderStatus, role: Role) -> Vec<OrderStatus> {
  let mut allowed: Vec<OrderStatus> = table(from, role).to_vec();
  if role == Role::Admin && CANCELABLE_BY_ADMIN.contains(&from) && !allowed.contains(&OrderStatus::Cancelled) {
    allowed.push(OrderStatus::Cancelled);
  }
  allowed
}
