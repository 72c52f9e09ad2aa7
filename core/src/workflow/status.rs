// sauda_core/src/workflow/status.rs

//! Status transitions: role-scoped ownership checks, the state-machine gate,
//! and the conditional side effects (rider assignment, cancellation
//! recording, rider earning on delivery), all inside one transaction.

use crate::error::{Error, Result};
use crate::models::{CancellationReason, Order, OrderWithDetails};
use crate::state_machine::{can_transition, OrderStatus, Role};
use crate::workflow::OrderWorkflow;
use tracing::{info, instrument};
use uuid::Uuid;

/// A requested status change. `rider_id` is required when assigning a rider;
/// `cancellation_reason` overrides the role-based default when cancelling.
#[derive(Debug, Clone)]
pub struct StatusChange {
  pub status: OrderStatus,
  pub rider_id: Option<Uuid>,
  pub cancellation_reason: Option<CancellationReason>,
}

impl OrderWorkflow {
  /// Move an order to a new status on behalf of `acting_user_id`.
  ///
  /// Ownership is role-scoped: customers may only touch their own orders,
  /// store owners their store's, riders their assignments; admins bypass the
  /// check. Violations report OrderNotFound so unauthorized callers learn
  /// nothing about the order's existence. The order row is locked for the
  /// duration, which serializes racing transitions (and makes the
  /// rider-earning guard on DELIVERED airtight).
  #[instrument(skip(self, change), fields(order_id = %order_id, role = %role, target = %change.status))]
  pub async fn update_order_status(
    &self,
    order_id: Uuid,
    acting_user_id: Uuid,
    role: Role,
    change: StatusChange,
  ) -> Result<OrderWithDetails> {
    let mut tx = self.pool.begin().await?;

    let order = sqlx::query_as::<_, Order>(
      "SELECT id, customer_id, store_id, address_id, rider_id, subtotal_amount, delivery_fee, \
              service_fee, commission_amount, total_amount, payment_method, payment_status, \
              order_status, cancellation_reason, cancelled_by_role, notes, created_at, updated_at \
       FROM orders WHERE id = $1 FOR UPDATE",
    )
    .bind(order_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(Error::OrderNotFound)?;

    self.check_ownership(&mut tx, &order, acting_user_id, role).await?;

    let to = change.status;
    if !can_transition(order.order_status, to, role) {
      return Err(Error::InvalidTransition {
        from: order.order_status,
        to,
      });
    }

    // Rider assignment needs a validated, active rider.
    let rider_after = if to == OrderStatus::RiderAssigned {
      let rider_id = change.rider_id.ok_or(Error::MissingRider)?;
      let active = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE id = $1 AND role = $2 AND is_active = TRUE",
      )
      .bind(rider_id)
      .bind(Role::Rider)
      .fetch_one(&mut *tx)
      .await?;
      if active == 0 {
        return Err(Error::RiderNotFound);
      }
      Some(rider_id)
    } else if to == OrderStatus::ReadyForPickup && order.order_status == OrderStatus::RiderAssigned {
      // Bounced assignment goes back to the pickup queue without a rider.
      None
    } else {
      order.rider_id
    };

    let (reason, cancelled_by) = match to {
      OrderStatus::Cancelled => (
        Some(change.cancellation_reason.unwrap_or(CancellationReason::default_for(role))),
        Some(role),
      ),
      OrderStatus::StoreRejected => (Some(CancellationReason::StoreRejected), Some(role)),
      _ => (order.cancellation_reason, order.cancelled_by_role),
    };

    let updated = sqlx::query_as::<_, Order>(
      "UPDATE orders SET order_status = $2, rider_id = $3, cancellation_reason = $4, \
              cancelled_by_role = $5, updated_at = now() \
       WHERE id = $1 \
       RETURNING id, customer_id, store_id, address_id, rider_id, subtotal_amount, delivery_fee, \
                 service_fee, commission_amount, total_amount, payment_method, payment_status, \
                 order_status, cancellation_reason, cancelled_by_role, notes, created_at, updated_at",
    )
    .bind(order_id)
    .bind(to)
    .bind(rider_after)
    .bind(reason)
    .bind(cancelled_by)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO order_status_history (order_id, status, changed_by_user_id) VALUES ($1, $2, $3)")
      .bind(order_id)
      .bind(to)
      .bind(acting_user_id)
      .execute(&mut *tx)
      .await?;

    if to == OrderStatus::Delivered {
      self.record_rider_earning(&mut tx, &updated).await?;
    }

    tx.commit().await?;
    info!(from = %order.order_status, to = %to, "order status updated");

    self.load_details(updated).await
  }

  async fn check_ownership(
    &self,
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order: &Order,
    acting_user_id: Uuid,
    role: Role,
  ) -> Result<()> {
    let owned = match role {
      Role::Customer => order.customer_id == acting_user_id,
      Role::Rider => order.rider_id == Some(acting_user_id),
      Role::StoreOwner => {
        let store_id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM stores WHERE owner_id = $1")
          .bind(acting_user_id)
          .fetch_optional(&mut **tx)
          .await?;
        store_id == Some(order.store_id)
      }
      Role::Admin => true,
    };
    if owned {
      Ok(())
    } else {
      Err(Error::OrderNotFound)
    }
  }

  /// Pay the rider their delivery fee, exactly once per order. The existence
  /// check runs under the order row lock taken by the caller, so a retried or
  /// concurrent DELIVERED transition cannot double-pay.
  async fn record_rider_earning(
    &self,
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order: &Order,
  ) -> Result<()> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM rider_earnings WHERE order_id = $1")
      .bind(order.id)
      .fetch_one(&mut **tx)
      .await?;
    if existing > 0 {
      return Ok(());
    }

    let rider_id = order.rider_id.ok_or(Error::MissingRider)?;
    sqlx::query("INSERT INTO rider_earnings (rider_id, order_id, earning_amount) VALUES ($1, $2, $3)")
      .bind(rider_id)
      .bind(order.id)
      .bind(order.delivery_fee)
      .execute(&mut **tx)
      .await?;
    info!(order_id = %order.id, rider_id = %rider_id, amount = %order.delivery_fee, "rider earning recorded");
    Ok(())
  }
}
