// sauda_server/src/web/handlers/mod.rs

pub mod identity;
pub mod order_handlers;

pub use identity::Identity;
