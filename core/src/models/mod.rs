// sauda_core/src/models/mod.rs

//! Row types for everything the engine reads or writes, one file per area.
//! All of them map straight onto the Postgres schema in `migrations/`.

pub mod cart;
pub mod catalog;
pub mod earnings;
pub mod order;
pub mod pending_payment;

pub use cart::CartLine;
pub use catalog::{Address, Product, SavedPaymentMethod, Store};
pub use earnings::{RiderEarning, StoreEarning};
pub use order::{
  CancellationReason, Order, OrderItem, OrderStatusHistory, OrderWithDetails, PaymentMethod, PaymentStatus,
};
pub use pending_payment::{PendingPayment, PendingPaymentStatus};
