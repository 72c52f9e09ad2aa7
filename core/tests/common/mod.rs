// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use rust_decimal::Decimal;
use sauda::payments::{CreatedIntent, IntentRequest, PaymentIntentCreator, PaymentVerification, PaymentVerifier};
use sauda::{Error, FeePolicy, OrderWorkflow, SessionConfig};
use sqlx::PgPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

// --- Mock payment providers ---

/// Verifier that always reports the same provider status.
pub struct StaticVerifier {
  pub status: Option<&'static str>,
  pub calls: AtomicUsize,
}

impl StaticVerifier {
  pub fn confirming() -> Arc<Self> {
    Arc::new(Self {
      status: Some("succeeded"),
      calls: AtomicUsize::new(0),
    })
  }

  pub fn rejecting() -> Arc<Self> {
    Arc::new(Self {
      status: Some("requires_action"),
      calls: AtomicUsize::new(0),
    })
  }

  /// Simulates a provider outage or timeout: nothing comes back.
  pub fn unreachable() -> Arc<Self> {
    Arc::new(Self {
      status: None,
      calls: AtomicUsize::new(0),
    })
  }
}

#[async_trait]
impl PaymentVerifier for StaticVerifier {
  async fn verify(&self, _reference: &str) -> Option<PaymentVerification> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.status.map(|s| PaymentVerification {
      status: s.to_string(),
      amount: None,
    })
  }
}

/// Intent creator that either hands out fresh mock intents or fails like a
/// provider 5xx.
pub struct StaticIntents {
  pub fail: bool,
}

#[async_trait]
impl PaymentIntentCreator for StaticIntents {
  async fn create_intent(&self, request: IntentRequest) -> Result<CreatedIntent, Error> {
    if self.fail {
      return Err(Error::Provider("simulated provider failure".to_string()));
    }
    let intent_id = format!("mock_pi_{}", request.order_reference.simple());
    Ok(CreatedIntent {
      client_secret: Some(format!("{intent_id}_secret")),
      redirect_url: Some(format!("https://pay.example.test/{intent_id}")),
      encryption_key: None,
      intent_id,
    })
  }
}

// --- Engine construction ---

pub fn engine_with(
  pool: &PgPool,
  verifier: Arc<dyn PaymentVerifier>,
  intents: Arc<dyn PaymentIntentCreator>,
) -> OrderWorkflow {
  OrderWorkflow::new(
    pool.clone(),
    FeePolicy::default(),
    verifier,
    intents,
    SessionConfig::default(),
  )
}

/// Engine with a confirming verifier and a working intent creator.
pub fn engine(pool: &PgPool) -> OrderWorkflow {
  engine_with(pool, StaticVerifier::confirming(), Arc::new(StaticIntents { fail: false }))
}

// --- Seed helpers ---

pub async fn seed_user(pool: &PgPool, name: &str, role: &str, is_active: bool) -> Uuid {
  sqlx::query_scalar::<_, Uuid>(
    "INSERT INTO users (name, email, phone, role, is_active) \
     VALUES ($1, $2, '03001234567', $3::user_role, $4) RETURNING id",
  )
  .bind(name)
  .bind(format!("{}@example.test", name.to_lowercase().replace(' ', ".")))
  .bind(role)
  .bind(is_active)
  .fetch_one(pool)
  .await
  .expect("seed user")
}

pub async fn seed_address(pool: &PgPool, user_id: Uuid) -> Uuid {
  sqlx::query_scalar::<_, Uuid>(
    "INSERT INTO addresses (user_id, full_address, city) VALUES ($1, 'House 12, Street 4', 'Lahore') RETURNING id",
  )
  .bind(user_id)
  .fetch_one(pool)
  .await
  .expect("seed address")
}

pub async fn seed_store(pool: &PgPool, owner_id: Uuid) -> Uuid {
  sqlx::query_scalar::<_, Uuid>(
    "INSERT INTO stores (owner_id, name, address, is_approved, is_open) \
     VALUES ($1, 'Corner Mart', 'Main Bazaar', TRUE, TRUE) RETURNING id",
  )
  .bind(owner_id)
  .fetch_one(pool)
  .await
  .expect("seed store")
}

pub async fn seed_closed_store(pool: &PgPool, owner_id: Uuid) -> Uuid {
  sqlx::query_scalar::<_, Uuid>(
    "INSERT INTO stores (owner_id, name, address, is_approved, is_open) \
     VALUES ($1, 'Night Mart', 'Main Bazaar', TRUE, FALSE) RETURNING id",
  )
  .bind(owner_id)
  .fetch_one(pool)
  .await
  .expect("seed closed store")
}

pub async fn seed_product(pool: &PgPool, store_id: Uuid, name: &str, price: Decimal, stock: i64) -> Uuid {
  sqlx::query_scalar::<_, Uuid>(
    "INSERT INTO products (store_id, name, price, stock) VALUES ($1, $2, $3, $4) RETURNING id",
  )
  .bind(store_id)
  .bind(name)
  .bind(price)
  .bind(stock)
  .fetch_one(pool)
  .await
  .expect("seed product")
}

pub async fn seed_saved_payment_method(pool: &PgPool, user_id: Uuid) -> Uuid {
  sqlx::query_scalar::<_, Uuid>(
    "INSERT INTO saved_payment_methods (user_id, provider_id, brand, last4) \
     VALUES ($1, 'pm_mock_123', 'Visa', '4242') RETURNING id",
  )
  .bind(user_id)
  .fetch_one(pool)
  .await
  .expect("seed payment method")
}

/// The usual cast: a customer with an address, an owner with an approved open
/// store, and one product on the shelf.
pub struct Fixture {
  pub customer_id: Uuid,
  pub address_id: Uuid,
  pub owner_id: Uuid,
  pub store_id: Uuid,
  pub product_id: Uuid,
  pub product_price: Decimal,
}

pub async fn fixture(pool: &PgPool) -> Fixture {
  fixture_with_stock(pool, 10).await
}

pub async fn fixture_with_stock(pool: &PgPool, stock: i64) -> Fixture {
  let customer_id = seed_user(pool, "Asma Customer", "CUSTOMER", true).await;
  let address_id = seed_address(pool, customer_id).await;
  let owner_id = seed_user(pool, "Bilal Owner", "STORE_OWNER", true).await;
  let store_id = seed_store(pool, owner_id).await;
  let product_price = Decimal::new(25000, 2); // 250.00
  let product_id = seed_product(pool, store_id, "Chicken Karahi", product_price, stock).await;
  Fixture {
    customer_id,
    address_id,
    owner_id,
    store_id,
    product_id,
    product_price,
  }
}

// --- Row helpers ---

pub async fn count(pool: &PgPool, table: &str) -> i64 {
  sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
    .fetch_one(pool)
    .await
    .expect("count rows")
}

pub async fn product_stock(pool: &PgPool, product_id: Uuid) -> (i64, bool) {
  sqlx::query_as::<_, (i64, bool)>("SELECT stock, is_out_of_stock FROM products WHERE id = $1")
    .bind(product_id)
    .fetch_one(pool)
    .await
    .expect("product stock")
}
