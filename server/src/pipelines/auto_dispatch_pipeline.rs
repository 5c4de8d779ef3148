// server/src/pipelines/auto_dispatch_pipeline.rs

use crate::db;
use crate::errors::AppError;
use crate::pipelines::contexts::AutoDispatchCtxData;
use crate::pipelines::grab_order_pipeline::{assign_to_rider, ORDER_TAKEN, RIDER_NOT_FOUND};
use crate::services::order_locks::ORDER_BUSY;
use baoleme_core::{ContextData, FlowError, Pipeline, PipelineRegistry, StepControl};
use tracing::{debug, info, instrument};

pub const NO_AVAILABLE_ORDER: &str = "目前无空闲订单";

/// Candidates tried before giving up when other riders keep winning the race.
const MAX_ATTEMPTS: usize = 3;

pub fn register_auto_dispatch_pipeline(registry: &PipelineRegistry<AppError>) -> Result<(), FlowError> {
  let mut p = Pipeline::<AutoDispatchCtxData, AppError>::new(
    "auto_dispatch",
    &[("check_dispatch_mode", false, None), ("claim_random_order", false, None)],
  );

  p.on("check_dispatch_mode", check_dispatch_mode);
  p.on("claim_random_order", claim_random_order);

  registry.register(p)?;
  info!("Auto-dispatch pipeline registered.");
  Ok(())
}

#[instrument(name = "auto_dispatch::check_dispatch_mode", skip(ctx))]
async fn check_dispatch_mode(ctx: ContextData<AutoDispatchCtxData>) -> Result<StepControl, AppError> {
  let (pool, rider_id) = {
    let guard = ctx.read();
    (guard.app_state.db_pool.clone(), guard.rider_id)
  };
  let rider = db::riders::find_by_id(&pool, rider_id)
    .await?
    .ok_or_else(|| AppError::NotFound(RIDER_NOT_FOUND.to_string()))?;
  rider.mode()?.ensure_automatic()?;
  rider.state()?.ensure_can_auto_dispatch()?;
  ctx.write().rider = Some(rider);
  Ok(StepControl::Continue)
}

#[instrument(name = "auto_dispatch::claim_random_order", skip(ctx))]
async fn claim_random_order(ctx: ContextData<AutoDispatchCtxData>) -> Result<StepControl, AppError> {
  let (state, rider_id) = {
    let guard = ctx.read();
    (guard.app_state.clone(), guard.rider_id)
  };

  for attempt in 1..=MAX_ATTEMPTS {
    let Some(order_id) = db::orders::random_available_id(&state.db_pool).await? else {
      break;
    };
    let Some(_lock) = state.order_locks.try_acquire(order_id) else {
      debug!(order_id, attempt, "{}", ORDER_BUSY);
      continue;
    };
    match assign_to_rider(&state, order_id, rider_id).await {
      Ok(order) => {
        ctx.write().order = Some(order);
        return Ok(StepControl::Continue);
      }
      Err(AppError::Conflict(msg)) if msg == ORDER_TAKEN => {
        debug!(order_id, attempt, "Lost the race, picking another order.");
      }
      Err(other) => return Err(other),
    }
  }
  Err(AppError::NotFound(NO_AVAILABLE_ORDER.to_string()))
}
