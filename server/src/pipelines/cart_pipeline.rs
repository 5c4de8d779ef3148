// server/src/pipelines/cart_pipeline.rs

use crate::db;
use crate::errors::AppError;
use crate::pipelines::contexts::AddToCartCtxData;
use baoleme_core::domain::ListingStatus;
use baoleme_core::{ContextData, FlowError, Pipeline, PipelineRegistry, RuleViolation, StepControl};
use tracing::{info, instrument, warn};

pub fn register_add_to_cart_pipeline(registry: &PipelineRegistry<AppError>) -> Result<(), FlowError> {
  let mut p = Pipeline::<AddToCartCtxData, AppError>::new(
    "add_to_cart",
    &[
      ("validate_cart_input", false, None),
      ("check_product_on_sale", false, None),
      ("upsert_cart_line", false, None),
    ],
  );

  p.on("validate_cart_input", validate_cart_input);
  p.on("check_product_on_sale", check_product_on_sale);
  p.on("upsert_cart_line", upsert_cart_line);

  registry.register(p)?;
  info!("Add-to-cart pipeline registered.");
  Ok(())
}

async fn validate_cart_input(ctx: ContextData<AddToCartCtxData>) -> Result<StepControl, AppError> {
  let quantity = ctx.read().quantity;
  if quantity <= 0 {
    warn!(quantity, "Rejected non-positive cart quantity.");
    return Err(RuleViolation::NonPositiveQuantity.into());
  }
  Ok(StepControl::Continue)
}

#[instrument(name = "cart::check_product_on_sale", skip(ctx))]
async fn check_product_on_sale(ctx: ContextData<AddToCartCtxData>) -> Result<StepControl, AppError> {
  let (pool, product_id) = {
    let guard = ctx.read();
    (guard.app_state.db_pool.clone(), guard.product_id)
  };
  let product = db::products::find_by_id(&pool, product_id)
    .await?
    .ok_or_else(|| AppError::NotFound("商品不存在".to_string()))?;
  if !ListingStatus::try_from(product.status)?.is_open() {
    return Err(AppError::Validation("商品已下架".to_string()));
  }
  Ok(StepControl::Continue)
}

#[instrument(name = "cart::upsert_cart_line", skip(ctx))]
async fn upsert_cart_line(ctx: ContextData<AddToCartCtxData>) -> Result<StepControl, AppError> {
  let (pool, user_id, product_id, quantity) = {
    let guard = ctx.read();
    (guard.app_state.db_pool.clone(), guard.user_id, guard.product_id, guard.quantity)
  };
  let item = db::carts::add(&pool, user_id, product_id, quantity).await?;
  info!(user_id, product_id, quantity = item.quantity, "Cart line updated.");
  ctx.write().updated_item = Some(item);
  Ok(StepControl::Continue)
}
