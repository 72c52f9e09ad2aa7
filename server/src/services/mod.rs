// sauda_server/src/services/mod.rs

pub mod xpay;
