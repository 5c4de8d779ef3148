// server/src/pipelines/place_order_pipeline.rs

//! Order placement. Reads and checks happen step by step against the pool; every
//! write happens in `persist_order` inside one transaction.

use crate::db;
use crate::db::orders::NewOrder;
use crate::errors::AppError;
use crate::pipelines::contexts::{PlaceOrderCtxData, RequestedLine};
use baoleme_core::domain::pricing::{self, QuoteRequest};
use baoleme_core::domain::{ListingStatus, PricedLine};
use baoleme_core::{ContextData, FlowError, Pipeline, PipelineRegistry, RuleViolation, StepControl};
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{event, info, instrument, warn, Level};

pub fn register_place_order_pipeline(registry: &PipelineRegistry<AppError>) -> Result<(), FlowError> {
  let mut p = Pipeline::<PlaceOrderCtxData, AppError>::new(
    "place_order",
    &[
      ("validate_order_items", false, None),
      ("load_store", false, None),
      ("price_lines", false, None),
      ("persist_order", false, None),
      ("load_order_items", false, None),
    ],
  );

  p.on("validate_order_items", validate_order_items);
  p.on("load_store", load_store);
  p.on("price_lines", price_lines);
  p.on("persist_order", persist_order);
  p.on("load_order_items", load_order_items);

  registry.register(p)?;
  info!("Place-order pipeline registered.");
  Ok(())
}

/// Same product listed twice becomes one line.
fn merge_lines(items: &[RequestedLine]) -> Result<Vec<RequestedLine>, RuleViolation> {
  let mut merged: BTreeMap<i64, i32> = BTreeMap::new();
  for item in items {
    let total = merged.entry(item.product_id).or_insert(0);
    *total = total.checked_add(item.quantity).ok_or(RuleViolation::QuantityTooLarge)?;
  }
  Ok(
    merged
      .into_iter()
      .map(|(product_id, quantity)| RequestedLine { product_id, quantity })
      .collect(),
  )
}

#[instrument(name = "place_order::validate_order_items", skip(ctx))]
async fn validate_order_items(ctx: ContextData<PlaceOrderCtxData>) -> Result<StepControl, AppError> {
  let items = ctx.read().items.clone();
  pricing::ensure_quantities(items.iter().map(|i| i.quantity))?;
  let merged = merge_lines(&items)?;
  event!(Level::DEBUG, lines = merged.len(), "Order items validated.");
  ctx.write().items = merged;
  Ok(StepControl::Continue)
}

#[instrument(name = "place_order::load_store", skip(ctx))]
async fn load_store(ctx: ContextData<PlaceOrderCtxData>) -> Result<StepControl, AppError> {
  let (pool, user_id, store_id) = {
    let guard = ctx.read();
    (guard.app_state.db_pool.clone(), guard.user_id, guard.store_id)
  };
  if db::users::find_by_id(&pool, user_id).await?.is_none() {
    return Err(AppError::NotFound("用户不存在".to_string()));
  }
  let store = db::stores::find_by_id(&pool, store_id)
    .await?
    .ok_or_else(|| AppError::NotFound("店铺不存在".to_string()))?;
  if !ListingStatus::try_from(store.status)?.is_open() {
    warn!(store_id, "Order placed at a closed store.");
    return Err(AppError::Validation("店铺已打烊".to_string()));
  }
  ctx.write().store = Some(store);
  Ok(StepControl::Continue)
}

#[instrument(name = "place_order::price_lines", skip(ctx))]
async fn price_lines(ctx: ContextData<PlaceOrderCtxData>) -> Result<StepControl, AppError> {
  let (pool, store_id, items) = {
    let guard = ctx.read();
    (guard.app_state.db_pool.clone(), guard.store_id, guard.items.clone())
  };
  let ids: Vec<i64> = items.iter().map(|i| i.product_id).collect();
  let products = db::products::find_many(&pool, &ids).await?;

  let mut lines = Vec::with_capacity(items.len());
  for item in &items {
    let product = products
      .iter()
      .find(|p| p.id == item.product_id)
      .ok_or_else(|| AppError::NotFound(format!("商品不存在: {}", item.product_id)))?;
    if product.store_id != store_id {
      return Err(AppError::Validation(format!("商品不属于该店铺: {}", product.name)));
    }
    if !ListingStatus::try_from(product.status)?.is_open() {
      return Err(AppError::Validation(format!("商品已下架: {}", product.name)));
    }
    let line = PricedLine {
      product_id: product.id,
      name: product.name.clone(),
      unit_price: product.price,
      quantity: item.quantity,
      stock: product.stock,
    };
    line.ensure_in_stock()?;
    lines.push(line);
  }
  ctx.write().priced_lines = lines;
  Ok(StepControl::Continue)
}

#[instrument(name = "place_order::persist_order", skip(ctx))]
async fn persist_order(ctx: ContextData<PlaceOrderCtxData>) -> Result<StepControl, AppError> {
  let data = ctx.snapshot();
  let store = data
    .store
    .as_ref()
    .ok_or_else(|| AppError::Internal("store missing before order persistence".to_string()))?;
  let now = Utc::now();

  let mut tx = data.app_state.db_pool.begin().await?;

  let coupon = match data.coupon_id {
    Some(coupon_id) => {
      let row = db::coupons::find_for_update(&mut *tx, coupon_id)
        .await?
        .ok_or_else(|| AppError::NotFound("优惠券不存在".to_string()))?;
      Some(row.policy()?)
    }
    None => None,
  };
  let quote = pricing::quote(QuoteRequest {
    user_id: data.user_id,
    store_id: data.store_id,
    lines: &data.priced_lines,
    coupon: coupon.as_ref(),
    delivery_price: data.delivery_price,
    now,
  })?;

  let order = db::orders::insert(
    &mut *tx,
    NewOrder {
      user_id: data.user_id,
      store_id: data.store_id,
      user_location: &data.user_location,
      store_location: store.location.as_deref(),
      total_price: quote.total_price,
      actual_price: quote.actual_price,
      delivery_price: quote.delivery_price,
      remark: data.remark.as_deref(),
    },
  )
  .await?;

  for line in &data.priced_lines {
    db::orders::insert_item(&mut *tx, order.id, line.product_id, line.quantity).await?;
    if !db::products::take_stock(&mut *tx, line.product_id, line.quantity).await? {
      warn!(product_id = line.product_id, "Stock ran out while placing the order.");
      return Err(
        RuleViolation::InsufficientStock {
          product: line.name.clone(),
        }
        .into(),
      );
    }
  }

  if let Some(coupon_id) = data.coupon_id {
    if !db::coupons::redeem(&mut *tx, coupon_id, data.user_id).await? {
      return Err(RuleViolation::CouponUnusable("优惠券已使用".to_string()).into());
    }
  }
  db::carts::clear_store(&mut *tx, data.user_id, data.store_id).await?;
  tx.commit().await?;

  info!(order_id = order.id, actual_price = %quote.actual_price, "Order placed.");
  ctx.update(|d| {
    d.quote = Some(quote);
    d.order = Some(order);
  });
  Ok(StepControl::Continue)
}

async fn load_order_items(ctx: ContextData<PlaceOrderCtxData>) -> Result<StepControl, AppError> {
  let (pool, order_id) = {
    let guard = ctx.read();
    (guard.app_state.db_pool.clone(), guard.order.as_ref().map(|o| o.id))
  };
  let Some(order_id) = order_id else {
    return Err(AppError::Internal("order missing after persistence".to_string()));
  };
  let items = db::orders::items(&pool, order_id).await?;
  ctx.write().order_items = items;
  Ok(StepControl::Continue)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn repeated_products_are_merged() {
    let merged = merge_lines(&[
      RequestedLine { product_id: 7, quantity: 1 },
      RequestedLine { product_id: 3, quantity: 2 },
      RequestedLine { product_id: 7, quantity: 4 },
    ])
    .unwrap();
    assert_eq!(merged.len(), 2);
    assert_eq!((merged[0].product_id, merged[0].quantity), (3, 2));
    assert_eq!((merged[1].product_id, merged[1].quantity), (7, 5));
  }

  #[test]
  fn merged_quantity_overflow_is_rejected() {
    let result = merge_lines(&[
      RequestedLine { product_id: 1, quantity: i32::MAX },
      RequestedLine { product_id: 1, quantity: 1 },
    ]);
    assert_eq!(result.unwrap_err(), RuleViolation::QuantityTooLarge);
  }
}
