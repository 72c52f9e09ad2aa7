// tests/order_workflow_tests.rs
mod common;

use common::*;
use rust_decimal_macros::dec;
use sauda::models::{CancellationReason, PaymentMethod, PaymentStatus};
use sauda::{CartLine, Error, NewOrder, OrderStatus, PaymentProof, Role, StatusChange};
use sqlx::PgPool;
use uuid::Uuid;

fn cod_order(f: &Fixture, quantity: i32) -> NewOrder {
  NewOrder {
    store_id: f.store_id,
    address_id: f.address_id,
    items: vec![CartLine {
      product_id: f.product_id,
      quantity,
      price: f.product_price,
    }],
    payment_method: PaymentMethod::Cod,
    payment_proof: None,
    notes: None,
  }
}

fn change(status: OrderStatus) -> StatusChange {
  StatusChange {
    status,
    rider_id: None,
    cancellation_reason: None,
  }
}

fn assign(rider_id: Uuid) -> StatusChange {
  StatusChange {
    status: OrderStatus::RiderAssigned,
    rider_id: Some(rider_id),
    cancellation_reason: None,
  }
}

#[sqlx::test(migrations = "./migrations")]
async fn cod_order_writes_order_items_history_and_earning_atomically(pool: PgPool) {
  let f = fixture(&pool).await;
  let engine = engine(&pool);

  let created = engine.create_order(f.customer_id, cod_order(&f, 2)).await.unwrap();

  assert_eq!(created.order.order_status, OrderStatus::Pending);
  assert_eq!(created.order.payment_status, PaymentStatus::Pending);
  assert_eq!(created.order.subtotal_amount, dec!(500.00));
  assert_eq!(created.order.commission_amount, dec!(75.00));
  assert_eq!(created.order.delivery_fee, dec!(150));
  assert_eq!(created.order.service_fee, dec!(23.49));
  assert_eq!(created.order.total_amount, dec!(673.49));
  assert_eq!(created.items.len(), 1);
  assert_eq!(created.items[0].quantity, 2);
  assert_eq!(created.items[0].price, dec!(250.00));
  assert_eq!(created.store.id, f.store_id);
  assert_eq!(created.address.id, f.address_id);

  // Stock decremented, initial history row present, store earning written.
  let (stock, flagged) = product_stock(&pool, f.product_id).await;
  assert_eq!(stock, 8);
  assert!(!flagged);
  assert_eq!(count(&pool, "order_status_history").await, 1);
  let (store_amount, commission) =
    sqlx::query_as::<_, (rust_decimal::Decimal, rust_decimal::Decimal)>(
      "SELECT store_amount, commission_amount FROM store_earnings WHERE order_id = $1",
    )
    .bind(created.order.id)
    .fetch_one(&pool)
    .await
    .unwrap();
  assert_eq!(store_amount, dec!(425.00));
  assert_eq!(commission, dec!(75.00));
}

#[sqlx::test(migrations = "./migrations")]
async fn fractional_commission_split_survives_persistence(pool: PgPool) {
  let f = fixture(&pool).await;
  let engine = engine(&pool);
  // Subtotal 0.30: its 15% cut is 0.045, which a 2-decimal column would round.
  let product = seed_product(&pool, f.store_id, "Penny Candy", dec!(0.10), 10).await;

  let order = NewOrder {
    store_id: f.store_id,
    address_id: f.address_id,
    items: vec![CartLine {
      product_id: product,
      quantity: 3,
      price: dec!(0.10),
    }],
    payment_method: PaymentMethod::Cod,
    payment_proof: None,
    notes: None,
  };
  let created = engine.create_order(f.customer_id, order).await.unwrap();

  // Stored rows must carry the exact split, not a rounded one.
  let (subtotal, commission) = sqlx::query_as::<_, (rust_decimal::Decimal, rust_decimal::Decimal)>(
    "SELECT subtotal_amount, commission_amount FROM orders WHERE id = $1",
  )
  .bind(created.order.id)
  .fetch_one(&pool)
  .await
  .unwrap();
  assert_eq!(subtotal, dec!(0.30));
  assert_eq!(commission, dec!(0.045));

  let (store_amount, earned_commission) = sqlx::query_as::<_, (rust_decimal::Decimal, rust_decimal::Decimal)>(
    "SELECT store_amount, commission_amount FROM store_earnings WHERE order_id = $1",
  )
  .bind(created.order.id)
  .fetch_one(&pool)
  .await
  .unwrap();
  assert_eq!(store_amount, dec!(0.255));
  assert_eq!(earned_commission, dec!(0.045));
  assert_eq!(earned_commission + store_amount, subtotal);
}

#[sqlx::test(migrations = "./migrations")]
async fn create_rejects_foreign_address_and_unapproved_store(pool: PgPool) {
  let f = fixture(&pool).await;
  let engine = engine(&pool);

  let stranger = seed_user(&pool, "Someone Else", "CUSTOMER", true).await;
  let err = engine.create_order(stranger, cod_order(&f, 1)).await.unwrap_err();
  assert!(matches!(err, Error::AddressNotFound));

  let mut order = cod_order(&f, 1);
  order.store_id = Uuid::new_v4();
  let err = engine.create_order(f.customer_id, order).await.unwrap_err();
  assert!(matches!(err, Error::StoreNotFound));
}

#[sqlx::test(migrations = "./migrations")]
async fn create_rejects_closed_store(pool: PgPool) {
  let f = fixture(&pool).await;
  let engine = engine(&pool);
  let closed_store = seed_closed_store(&pool, f.owner_id).await;
  let product = seed_product(&pool, closed_store, "Biryani", dec!(300), 5).await;

  let order = NewOrder {
    store_id: closed_store,
    address_id: f.address_id,
    items: vec![CartLine {
      product_id: product,
      quantity: 1,
      price: dec!(300),
    }],
    payment_method: PaymentMethod::Cod,
    payment_proof: None,
    notes: None,
  };
  let err = engine.create_order(f.customer_id, order).await.unwrap_err();
  assert!(matches!(err, Error::StoreClosed));
}

#[sqlx::test(migrations = "./migrations")]
async fn insufficient_stock_names_the_product_and_rolls_back(pool: PgPool) {
  let f = fixture_with_stock(&pool, 1).await;
  let engine = engine(&pool);

  let err = engine.create_order(f.customer_id, cod_order(&f, 2)).await.unwrap_err();
  match err {
    Error::InsufficientStock { name, available } => {
      assert_eq!(name, "Chicken Karahi");
      assert_eq!(available, 1);
    }
    other => panic!("expected InsufficientStock, got {other:?}"),
  }

  // Nothing committed.
  assert_eq!(count(&pool, "orders").await, 0);
  let (stock, _) = product_stock(&pool, f.product_id).await;
  assert_eq!(stock, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn out_of_stock_sweep_flags_products_beyond_the_ordered_ones(pool: PgPool) {
  let f = fixture(&pool).await;
  let engine = engine(&pool);
  // A different product already at zero but never flagged.
  let stale = seed_product(&pool, f.store_id, "Day-old Naan", dec!(20), 0).await;

  engine.create_order(f.customer_id, cod_order(&f, 1)).await.unwrap();

  let (_, flagged) = product_stock(&pool, stale).await;
  assert!(flagged, "sweep must flag any product at or below zero stock");
}

#[sqlx::test(migrations = "./migrations")]
async fn ordering_the_last_unit_flags_the_product(pool: PgPool) {
  let f = fixture_with_stock(&pool, 1).await;
  let engine = engine(&pool);

  engine.create_order(f.customer_id, cod_order(&f, 1)).await.unwrap();

  let (stock, flagged) = product_stock(&pool, f.product_id).await;
  assert_eq!(stock, 0);
  assert!(flagged);
}

#[sqlx::test(migrations = "./migrations")]
async fn card_order_demands_a_payment_proof(pool: PgPool) {
  let f = fixture(&pool).await;
  let engine = engine(&pool);

  let mut order = cod_order(&f, 1);
  order.payment_method = PaymentMethod::Card;
  let err = engine.create_order(f.customer_id, order).await.unwrap_err();
  assert!(matches!(err, Error::MissingPaymentProof));

  // Precondition failure inside the transaction: stock untouched.
  let (stock, _) = product_stock(&pool, f.product_id).await;
  assert_eq!(stock, 10);
}

#[sqlx::test(migrations = "./migrations")]
async fn unconfirmed_card_payment_aborts_the_whole_order(pool: PgPool) {
  let f = fixture(&pool).await;
  let engine = engine_with(
    &pool,
    StaticVerifier::rejecting(),
    std::sync::Arc::new(StaticIntents { fail: false }),
  );

  let mut order = cod_order(&f, 1);
  order.payment_method = PaymentMethod::Card;
  order.payment_proof = Some(PaymentProof::ProviderIntent("pi_not_paid".to_string()));
  let err = engine.create_order(f.customer_id, order).await.unwrap_err();
  assert!(matches!(err, Error::PaymentNotConfirmed));

  assert_eq!(count(&pool, "orders").await, 0);
  let (stock, _) = product_stock(&pool, f.product_id).await;
  assert_eq!(stock, 10);
}

#[sqlx::test(migrations = "./migrations")]
async fn stock_shortfall_fails_before_the_provider_is_consulted(pool: PgPool) {
  let f = fixture_with_stock(&pool, 1).await;
  let verifier = StaticVerifier::confirming();
  let engine = engine_with(
    &pool,
    verifier.clone(),
    std::sync::Arc::new(StaticIntents { fail: false }),
  );

  let mut order = cod_order(&f, 2);
  order.payment_method = PaymentMethod::Card;
  order.payment_proof = Some(PaymentProof::ProviderIntent("pi_whatever".to_string()));
  let err = engine.create_order(f.customer_id, order).await.unwrap_err();
  assert!(matches!(err, Error::InsufficientStock { .. }));

  // Precondition order: stock is checked ahead of the payment proof, so the
  // provider is never called for an order that cannot be fulfilled.
  assert_eq!(verifier.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn card_order_with_confirmed_intent_is_paid(pool: PgPool) {
  let f = fixture(&pool).await;
  let engine = engine(&pool);

  let mut order = cod_order(&f, 1);
  order.payment_method = PaymentMethod::Card;
  order.payment_proof = Some(PaymentProof::ProviderIntent("pi_paid".to_string()));
  let created = engine.create_order(f.customer_id, order).await.unwrap();
  assert_eq!(created.order.payment_status, PaymentStatus::Paid);
  assert_eq!(created.order.payment_method, PaymentMethod::Card);
}

#[sqlx::test(migrations = "./migrations")]
async fn card_order_accepts_an_owned_saved_method(pool: PgPool) {
  let f = fixture(&pool).await;
  let engine = engine(&pool);
  let method_id = seed_saved_payment_method(&pool, f.customer_id).await;

  let mut order = cod_order(&f, 1);
  order.payment_method = PaymentMethod::Card;
  order.payment_proof = Some(PaymentProof::SavedMethod(method_id));
  let created = engine.create_order(f.customer_id, order).await.unwrap();
  assert_eq!(created.order.payment_status, PaymentStatus::Paid);

  // A method owned by someone else does not count.
  let stranger = seed_user(&pool, "Other Person", "CUSTOMER", true).await;
  let foreign_method = seed_saved_payment_method(&pool, stranger).await;
  let mut order = cod_order(&f, 1);
  order.payment_method = PaymentMethod::Card;
  order.payment_proof = Some(PaymentProof::SavedMethod(foreign_method));
  let err = engine.create_order(f.customer_id, order).await.unwrap_err();
  assert!(matches!(err, Error::PaymentMethodNotFound));
}

#[sqlx::test(migrations = "./migrations")]
async fn full_delivery_flow_pays_the_rider_exactly_once(pool: PgPool) {
  let f = fixture(&pool).await;
  let engine = engine(&pool);
  let rider_id = seed_user(&pool, "Raza Rider", "RIDER", true).await;
  let admin_id = seed_user(&pool, "Platform Admin", "ADMIN", true).await;

  let order_id = engine.create_order(f.customer_id, cod_order(&f, 1)).await.unwrap().order.id;

  engine
    .update_order_status(order_id, f.owner_id, Role::StoreOwner, change(OrderStatus::StoreAccepted))
    .await
    .unwrap();
  engine
    .update_order_status(order_id, f.owner_id, Role::StoreOwner, change(OrderStatus::ReadyForPickup))
    .await
    .unwrap();
  let assigned = engine
    .update_order_status(order_id, admin_id, Role::Admin, assign(rider_id))
    .await
    .unwrap();
  assert_eq!(assigned.order.rider_id, Some(rider_id));

  engine
    .update_order_status(order_id, rider_id, Role::Rider, change(OrderStatus::RiderAccepted))
    .await
    .unwrap();
  engine
    .update_order_status(order_id, rider_id, Role::Rider, change(OrderStatus::PickedUp))
    .await
    .unwrap();
  let delivered = engine
    .update_order_status(order_id, rider_id, Role::Rider, change(OrderStatus::Delivered))
    .await
    .unwrap();
  assert_eq!(delivered.order.order_status, OrderStatus::Delivered);

  let (earning_rider, earning_amount) =
    sqlx::query_as::<_, (Uuid, rust_decimal::Decimal)>(
      "SELECT rider_id, earning_amount FROM rider_earnings WHERE order_id = $1",
    )
    .bind(order_id)
    .fetch_one(&pool)
    .await
    .unwrap();
  assert_eq!(earning_rider, rider_id);
  assert_eq!(earning_amount, dec!(150));

  // Retrying the DELIVERED transition fails at the state machine and the
  // earning stays singular.
  let err = engine
    .update_order_status(order_id, rider_id, Role::Rider, change(OrderStatus::Delivered))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidTransition { .. }));
  assert_eq!(count(&pool, "rider_earnings").await, 1);

  // Audit trail is a prefix-consistent trace of every status held.
  let history: Vec<OrderStatus> = sqlx::query_scalar::<_, OrderStatus>(
    "SELECT status FROM order_status_history WHERE order_id = $1 ORDER BY created_at ASC",
  )
  .bind(order_id)
  .fetch_all(&pool)
  .await
  .unwrap();
  assert_eq!(
    history,
    vec![
      OrderStatus::Pending,
      OrderStatus::StoreAccepted,
      OrderStatus::ReadyForPickup,
      OrderStatus::RiderAssigned,
      OrderStatus::RiderAccepted,
      OrderStatus::PickedUp,
      OrderStatus::Delivered,
    ]
  );
}

#[sqlx::test(migrations = "./migrations")]
async fn rider_assignment_requires_an_active_rider(pool: PgPool) {
  let f = fixture(&pool).await;
  let engine = engine(&pool);
  let admin_id = seed_user(&pool, "Platform Admin", "ADMIN", true).await;
  let lapsed_rider = seed_user(&pool, "Lapsed Rider", "RIDER", false).await;

  let order_id = engine.create_order(f.customer_id, cod_order(&f, 1)).await.unwrap().order.id;
  engine
    .update_order_status(order_id, f.owner_id, Role::StoreOwner, change(OrderStatus::StoreAccepted))
    .await
    .unwrap();
  engine
    .update_order_status(order_id, f.owner_id, Role::StoreOwner, change(OrderStatus::ReadyForPickup))
    .await
    .unwrap();

  let err = engine
    .update_order_status(order_id, admin_id, Role::Admin, change(OrderStatus::RiderAssigned))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::MissingRider));

  let err = engine
    .update_order_status(order_id, admin_id, Role::Admin, assign(lapsed_rider))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::RiderNotFound));
}

#[sqlx::test(migrations = "./migrations")]
async fn bounced_assignment_clears_the_rider(pool: PgPool) {
  let f = fixture(&pool).await;
  let engine = engine(&pool);
  let rider_id = seed_user(&pool, "Raza Rider", "RIDER", true).await;
  let admin_id = seed_user(&pool, "Platform Admin", "ADMIN", true).await;

  let order_id = engine.create_order(f.customer_id, cod_order(&f, 1)).await.unwrap().order.id;
  engine
    .update_order_status(order_id, f.owner_id, Role::StoreOwner, change(OrderStatus::StoreAccepted))
    .await
    .unwrap();
  engine
    .update_order_status(order_id, f.owner_id, Role::StoreOwner, change(OrderStatus::ReadyForPickup))
    .await
    .unwrap();
  engine
    .update_order_status(order_id, admin_id, Role::Admin, assign(rider_id))
    .await
    .unwrap();

  let bounced = engine
    .update_order_status(order_id, rider_id, Role::Rider, change(OrderStatus::ReadyForPickup))
    .await
    .unwrap();
  assert_eq!(bounced.order.order_status, OrderStatus::ReadyForPickup);
  assert_eq!(bounced.order.rider_id, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn customer_cannot_accept_their_own_order(pool: PgPool) {
  let f = fixture(&pool).await;
  let engine = engine(&pool);

  let order_id = engine.create_order(f.customer_id, cod_order(&f, 1)).await.unwrap().order.id;
  engine
    .update_order_status(order_id, f.owner_id, Role::StoreOwner, change(OrderStatus::StoreAccepted))
    .await
    .unwrap();

  let err = engine
    .update_order_status(order_id, f.customer_id, Role::Customer, change(OrderStatus::StoreAccepted))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidTransition {
      from: OrderStatus::StoreAccepted,
      to: OrderStatus::StoreAccepted
    }
  ));
}

#[sqlx::test(migrations = "./migrations")]
async fn admin_override_cancels_where_the_rider_cannot(pool: PgPool) {
  let f = fixture(&pool).await;
  let engine = engine(&pool);
  let rider_id = seed_user(&pool, "Raza Rider", "RIDER", true).await;
  let admin_id = seed_user(&pool, "Platform Admin", "ADMIN", true).await;

  let order_id = engine.create_order(f.customer_id, cod_order(&f, 1)).await.unwrap().order.id;
  engine
    .update_order_status(order_id, f.owner_id, Role::StoreOwner, change(OrderStatus::StoreAccepted))
    .await
    .unwrap();
  engine
    .update_order_status(order_id, f.owner_id, Role::StoreOwner, change(OrderStatus::ReadyForPickup))
    .await
    .unwrap();
  engine
    .update_order_status(order_id, admin_id, Role::Admin, assign(rider_id))
    .await
    .unwrap();
  engine
    .update_order_status(order_id, rider_id, Role::Rider, change(OrderStatus::RiderAccepted))
    .await
    .unwrap();

  let err = engine
    .update_order_status(order_id, rider_id, Role::Rider, change(OrderStatus::Cancelled))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidTransition { .. }));

  let cancelled = engine
    .update_order_status(order_id, admin_id, Role::Admin, change(OrderStatus::Cancelled))
    .await
    .unwrap();
  assert_eq!(cancelled.order.order_status, OrderStatus::Cancelled);
  assert_eq!(cancelled.order.cancellation_reason, Some(CancellationReason::AdminCancelled));
  assert_eq!(cancelled.order.cancelled_by_role, Some(Role::Admin));
}

#[sqlx::test(migrations = "./migrations")]
async fn store_rejection_records_reason_and_role(pool: PgPool) {
  let f = fixture(&pool).await;
  let engine = engine(&pool);

  let order_id = engine.create_order(f.customer_id, cod_order(&f, 1)).await.unwrap().order.id;
  let rejected = engine
    .update_order_status(order_id, f.owner_id, Role::StoreOwner, change(OrderStatus::StoreRejected))
    .await
    .unwrap();
  assert_eq!(rejected.order.cancellation_reason, Some(CancellationReason::StoreRejected));
  assert_eq!(rejected.order.cancelled_by_role, Some(Role::StoreOwner));
}

#[sqlx::test(migrations = "./migrations")]
async fn ownership_violations_read_as_not_found(pool: PgPool) {
  let f = fixture(&pool).await;
  let engine = engine(&pool);
  let other_customer = seed_user(&pool, "Nosy Neighbor", "CUSTOMER", true).await;
  let other_owner = seed_user(&pool, "Rival Owner", "STORE_OWNER", true).await;
  seed_store(&pool, other_owner).await;

  let order_id = engine.create_order(f.customer_id, cod_order(&f, 1)).await.unwrap().order.id;

  let err = engine
    .update_order_status(order_id, other_customer, Role::Customer, change(OrderStatus::Cancelled))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::OrderNotFound));

  let err = engine
    .update_order_status(order_id, other_owner, Role::StoreOwner, change(OrderStatus::StoreAccepted))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::OrderNotFound));
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_orders_cannot_oversell_the_last_unit(pool: PgPool) {
  let f = fixture_with_stock(&pool, 1).await;
  let engine = engine(&pool);

  let mut handles = Vec::new();
  for _ in 0..4 {
    let engine = engine.clone();
    let order = cod_order(&f, 1);
    let customer_id = f.customer_id;
    handles.push(tokio::spawn(async move { engine.create_order(customer_id, order).await }));
  }

  let mut successes = 0;
  let mut stock_failures = 0;
  for handle in handles {
    match handle.await.unwrap() {
      Ok(_) => successes += 1,
      Err(Error::InsufficientStock { .. }) => stock_failures += 1,
      Err(other) => panic!("unexpected error: {other:?}"),
    }
  }
  assert_eq!(successes, 1);
  assert_eq!(stock_failures, 3);
  assert_eq!(count(&pool, "orders").await, 1);

  let (stock, flagged) = product_stock(&pool, f.product_id).await;
  assert_eq!(stock, 0);
  assert!(flagged);
}
