// sauda_core/src/lib.rs

//! Sauda: the order lifecycle engine for a multi-role delivery marketplace.
//!
//! Customers order from stores, store owners accept or reject, riders deliver,
//! and an admin operates the platform. This crate implements the part of that
//! system with real design content:
//!  - A pure, role-gated order status state machine.
//!  - Exact-decimal fee and commission arithmetic.
//!  - A store-hours gate deciding whether a store accepts new orders.
//!  - The transactional workflow engine: order creation (stock decrement,
//!    payment verification, earning and audit rows, all-or-nothing) and
//!    status transitions with their conditional side effects.
//!  - Redirect-based card payment sessions: time-boxed pending payments that
//!    reconcile a provider confirmation into exactly one order.
//!
//! Everything stateful goes through Postgres via `sqlx`; every public workflow
//! operation is a single transaction. Authentication, catalog CRUD, and
//! notification delivery are collaborators outside this crate.

pub mod error;
pub mod fees;
pub mod models;
pub mod payments;
pub mod state_machine;
pub mod store_hours;
pub mod workflow;

// --- Re-exports for the Public API ---

pub use crate::error::{Error, Result};
pub use crate::fees::{FeePolicy, OrderTotals};
pub use crate::models::{
  CancellationReason, CartLine, Order, OrderItem, OrderStatusHistory, OrderWithDetails, PaymentMethod, PaymentStatus,
  PendingPayment, RiderEarning, StoreEarning,
};
pub use crate::payments::{
  CreatedIntent, CustomerContact, IntentRequest, PaymentIntentCreator, PaymentVerification, PaymentVerifier,
};
pub use crate::state_machine::{allowed_transitions, can_transition, OrderStatus, Role};
pub use crate::workflow::{
  NewOrder, OrderWorkflow, PaymentProof, PaymentRedirect, PaymentRequest, SessionConfig, StatusChange,
};
