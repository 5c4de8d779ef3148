// server/src/pipelines/grab_order_pipeline.rs

use crate::db;
use crate::errors::AppError;
use crate::models::Order;
use crate::pipelines::contexts::GrabOrderCtxData;
use crate::services::order_locks::ORDER_BUSY;
use crate::state::AppState;
use baoleme_core::domain::RiderState;
use baoleme_core::{ContextData, FlowError, Pipeline, PipelineRegistry, StepControl};
use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};

pub const ORDER_TAKEN: &str = "订单已被抢或不存在";
pub const RIDER_NOT_FOUND: &str = "骑手不存在";

pub fn register_grab_order_pipeline(registry: &PipelineRegistry<AppError>) -> Result<(), FlowError> {
  let mut p = Pipeline::<GrabOrderCtxData, AppError>::new(
    "grab_order",
    &[
      ("check_rider_online", false, None),
      ("lock_order", false, None),
      ("assign_order", false, None),
    ],
  );

  p.on("check_rider_online", check_rider_online);
  p.on("lock_order", lock_order);
  p.on("assign_order", assign_order);
  // The in-process lock is only needed until the row is updated.
  p.after("assign_order", |ctx: ContextData<GrabOrderCtxData>| async move {
    let released = ctx.write().lock.take();
    drop(released);
    Ok::<_, AppError>(StepControl::Continue)
  });

  registry.register(p)?;
  info!("Grab-order pipeline registered.");
  Ok(())
}

#[instrument(name = "grab_order::check_rider_online", skip(ctx))]
async fn check_rider_online(ctx: ContextData<GrabOrderCtxData>) -> Result<StepControl, AppError> {
  let (pool, rider_id) = {
    let guard = ctx.read();
    (guard.app_state.db_pool.clone(), guard.rider_id)
  };
  let rider = db::riders::find_by_id(&pool, rider_id)
    .await?
    .ok_or_else(|| AppError::NotFound(RIDER_NOT_FOUND.to_string()))?;
  rider.state()?.ensure_can_grab()?;
  Ok(StepControl::Continue)
}

async fn lock_order(ctx: ContextData<GrabOrderCtxData>) -> Result<StepControl, AppError> {
  let (locks, order_id) = {
    let guard = ctx.read();
    (guard.app_state.order_locks.clone(), guard.order_id)
  };
  let Some(lock) = locks.try_acquire(order_id) else {
    warn!(order_id, "Order is locked by another request.");
    return Err(AppError::Conflict(ORDER_BUSY.to_string()));
  };
  ctx.write().lock = Some(lock);
  Ok(StepControl::Continue)
}

#[instrument(name = "grab_order::assign_order", skip(ctx))]
async fn assign_order(ctx: ContextData<GrabOrderCtxData>) -> Result<StepControl, AppError> {
  let (state, rider_id, order_id) = {
    let guard = ctx.read();
    (guard.app_state.clone(), guard.rider_id, guard.order_id)
  };
  let order = assign_to_rider(&state, order_id, rider_id).await?;
  ctx.write().order = Some(order);
  Ok(StepControl::Continue)
}

/// Conditional assignment shared by manual grabbing and automatic dispatch.
///
/// The update only matches a pending order with no rider, so a lost race comes
/// back as [`ORDER_TAKEN`] rather than overwriting the winner.
#[instrument(name = "grab_order::assign_to_rider", skip(state), err(Display))]
pub async fn assign_to_rider(state: &AppState, order_id: i64, rider_id: i64) -> Result<Order, AppError> {
  let deadline = Utc::now() + Duration::minutes(state.config.pickup_window_minutes);
  let mut tx = state.db_pool.begin().await?;
  let Some(order) = db::orders::assign_rider(&mut *tx, order_id, rider_id, deadline).await? else {
    warn!(order_id, rider_id, "Order was already taken.");
    return Err(AppError::Conflict(ORDER_TAKEN.to_string()));
  };
  db::riders::set_state(&mut *tx, rider_id, RiderState::Busy).await?;
  tx.commit().await?;
  info!(order_id, rider_id, "Order assigned to rider.");
  Ok(order)
}
