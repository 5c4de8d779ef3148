// server/src/pipelines/delivery_progress_pipeline.rs

//! Rider-driven status changes: releasing an accepted order, picking it up and
//! completing the delivery.

use crate::db;
use crate::errors::AppError;
use crate::pipelines::contexts::DeliveryProgressCtxData;
use baoleme_core::domain::order_status::check_transition;
use baoleme_core::domain::{OrderStatus, Role};
use baoleme_core::{ContextData, FlowError, Pipeline, PipelineRegistry, StepControl};
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{info, instrument, warn};

pub const NOT_YOUR_ORDER: &str = "无权操作该订单";
pub const ORDER_NOT_FOUND: &str = "订单不存在";
pub const ORDER_CHANGED: &str = "订单状态已变更，请刷新后重试";

pub fn register_delivery_progress_pipeline(registry: &PipelineRegistry<AppError>) -> Result<(), FlowError> {
  let mut p = Pipeline::<DeliveryProgressCtxData, AppError>::new(
    "delivery_progress",
    &[
      ("load_assigned_order", false, None),
      ("check_transition", false, None),
      ("apply_transition", false, None),
    ],
  );

  p.on("load_assigned_order", load_assigned_order);
  p.on("check_transition", check_rider_transition);
  p.on("apply_transition", apply_transition);

  registry.register(p)?;
  info!("Delivery-progress pipeline registered.");
  Ok(())
}

/// Delivery fee in whole cents, rounded half-up.
pub fn fee_in_cents(delivery_price: Decimal) -> i64 {
  (delivery_price * Decimal::ONE_HUNDRED)
    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
    .to_i64()
    .unwrap_or(0)
}

#[instrument(name = "delivery_progress::load_assigned_order", skip(ctx))]
async fn load_assigned_order(ctx: ContextData<DeliveryProgressCtxData>) -> Result<StepControl, AppError> {
  let (pool, rider_id, order_id) = {
    let guard = ctx.read();
    (guard.app_state.db_pool.clone(), guard.rider_id, guard.order_id)
  };
  let order = db::orders::find_by_id(&pool, order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(ORDER_NOT_FOUND.to_string()))?;
  if order.rider_id != Some(rider_id) {
    warn!(order_id, rider_id, "Rider tried to move an order assigned to someone else.");
    return Err(AppError::Forbidden(NOT_YOUR_ORDER.to_string()));
  }
  ctx.write().current = Some(order);
  Ok(StepControl::Continue)
}

async fn check_rider_transition(ctx: ContextData<DeliveryProgressCtxData>) -> Result<StepControl, AppError> {
  let (current, target) = {
    let guard = ctx.read();
    (guard.current.as_ref().map(|o| o.status), guard.target)
  };
  let current = current.ok_or_else(|| AppError::Internal("order missing before transition check".to_string()))?;
  check_transition(OrderStatus::try_from(current)?, target, Role::Rider)?;
  Ok(StepControl::Continue)
}

#[instrument(name = "delivery_progress::apply_transition", skip(ctx))]
async fn apply_transition(ctx: ContextData<DeliveryProgressCtxData>) -> Result<StepControl, AppError> {
  let (state, rider_id, target, current) = {
    let guard = ctx.read();
    (guard.app_state.clone(), guard.rider_id, guard.target, guard.current.clone())
  };
  let current = current.ok_or_else(|| AppError::Internal("order missing before transition".to_string()))?;
  let from = current.order_status()?;

  let mut tx = state.db_pool.begin().await?;
  let moved = if target == OrderStatus::Pending {
    db::orders::release_rider(&mut *tx, current.id, rider_id).await?
  } else {
    db::orders::transition(&mut *tx, current.id, from, target, None).await?
  };
  if !moved {
    return Err(AppError::Conflict(ORDER_CHANGED.to_string()));
  }

  match target {
    OrderStatus::Completed => {
      db::riders::credit_balance(&mut *tx, rider_id, fee_in_cents(current.delivery_price)).await?;
      let rows = db::sales::record_order(&mut *tx, current.id, Utc::now().date_naive()).await?;
      db::riders::settle_state(&mut *tx, rider_id).await?;
      info!(order_id = current.id, sale_rows = rows, "Delivery completed.");
    }
    OrderStatus::Pending => {
      db::riders::settle_state(&mut *tx, rider_id).await?;
      info!(order_id = current.id, "Order released back to the pool.");
    }
    _ => info!(order_id = current.id, to = target.code(), "Order status advanced."),
  }

  let updated = db::orders::find_by_id(&mut *tx, current.id).await?;
  tx.commit().await?;
  ctx.write().updated = updated;
  Ok(StepControl::Continue)
}

#[cfg(test)]
mod tests {
  use super::fee_in_cents;
  use rust_decimal::Decimal;
  use std::str::FromStr;

  #[test]
  fn delivery_fee_converts_to_cents() {
    assert_eq!(fee_in_cents(Decimal::from_str("3.50").unwrap()), 350);
    assert_eq!(fee_in_cents(Decimal::from_str("0.005").unwrap()), 1);
    assert_eq!(fee_in_cents(Decimal::ZERO), 0);
  }
}
