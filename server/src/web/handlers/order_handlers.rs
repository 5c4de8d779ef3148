// server/src/web/handlers/order_handlers.rs

//! Rider and merchant order operations.

use actix_web::{web, HttpResponse};
use baoleme_core::domain::order_status::check_merchant_update;
use baoleme_core::domain::{OrderStatus, Role};
use baoleme_core::ContextData;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument};

use super::{run_pipeline, trimmed, PageQuery};
use crate::db;
use crate::db::orders::OrderFilter;
use crate::errors::AppError;
use crate::models::Order;
use crate::pipelines::common_steps;
use crate::pipelines::contexts::{DeliveryProgressCtxData, GrabOrderCtxData};
use crate::pipelines::delivery_progress_pipeline::{ORDER_CHANGED, ORDER_NOT_FOUND};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedPrincipal;
use crate::web::response::ok;

// --- Rider side ---

pub async fn available(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
  auth.require(Role::Rider)?;
  let page = db::orders::list_available(&state.db_pool, query.into_inner().request()?).await?;
  Ok(ok(page))
}

#[derive(Debug, Deserialize)]
pub struct OrderIdRequest {
  pub order_id: i64,
}

#[instrument(name = "handler::grab_order", skip_all, fields(rider_id = auth.id(), order_id = payload.order_id))]
pub async fn grab(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<OrderIdRequest>,
) -> Result<HttpResponse, AppError> {
  let rider_id = auth.require(Role::Rider)?;
  let ctx = ContextData::new(GrabOrderCtxData {
    app_state: state.get_ref().clone(),
    rider_id,
    order_id: payload.order_id,
    lock: None,
    order: None,
  });
  run_pipeline(&state, ctx.clone()).await?;
  let order = ctx.write().order.take();
  let order = order.ok_or_else(|| AppError::Internal("grab finished without an order".to_string()))?;
  info!("Order grabbed.");
  Ok(ok(order))
}

async fn advance_as_rider(state: &AppState, rider_id: i64, order_id: i64, target: OrderStatus) -> Result<Order, AppError> {
  let ctx = ContextData::new(DeliveryProgressCtxData {
    app_state: state.clone(),
    rider_id,
    order_id,
    target,
    current: None,
    updated: None,
  });
  run_pipeline(state, ctx.clone()).await?;
  let updated = ctx.read().updated.clone();
  updated.ok_or_else(|| AppError::NotFound(ORDER_NOT_FOUND.to_string()))
}

/// Hands an accepted order back to the pool.
#[instrument(name = "handler::rider_cancel_order", skip_all, fields(rider_id = auth.id(), order_id = payload.order_id))]
pub async fn rider_cancel(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<OrderIdRequest>,
) -> Result<HttpResponse, AppError> {
  let rider_id = auth.require(Role::Rider)?;
  let order = advance_as_rider(&state, rider_id, payload.order_id, OrderStatus::Pending).await?;
  Ok(ok(order))
}

#[derive(Debug, Deserialize)]
pub struct RiderStatusRequest {
  pub order_id: i64,
  pub target_status: i16,
}

#[instrument(
  name = "handler::rider_update_status",
  skip_all,
  fields(rider_id = auth.id(), order_id = payload.order_id, target = payload.target_status)
)]
pub async fn rider_update_status(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<RiderStatusRequest>,
) -> Result<HttpResponse, AppError> {
  let rider_id = auth.require(Role::Rider)?;
  let target = OrderStatus::try_from(payload.target_status)?;
  let order = advance_as_rider(&state, rider_id, payload.order_id, target).await?;
  Ok(ok(order))
}

#[derive(Debug, Deserialize)]
pub struct OrderHistoryRequest {
  pub status: Option<i16>,
  pub start_time: Option<DateTime<Utc>>,
  pub end_time: Option<DateTime<Utc>>,
  #[serde(flatten)]
  pub page: PageQuery,
}

pub async fn rider_history(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<OrderHistoryRequest>,
) -> Result<HttpResponse, AppError> {
  let rider_id = auth.require(Role::Rider)?;
  let req = payload.into_inner();
  let filter = OrderFilter {
    rider_id: Some(rider_id),
    status: req.status,
    start_time: req.start_time,
    end_time: req.end_time,
    ..Default::default()
  };
  let page = db::orders::list(&state.db_pool, &filter, req.page.request()?).await?;
  Ok(ok(page))
}

fn month_start(today: NaiveDate) -> DateTime<Utc> {
  let first = today - chrono::Duration::days(i64::from(today.day0()));
  first.and_time(NaiveTime::MIN).and_utc()
}

pub async fn rider_earnings(state: web::Data<AppState>, auth: AuthenticatedPrincipal) -> Result<HttpResponse, AppError> {
  let rider_id = auth.require(Role::Rider)?;
  let earnings = db::riders::earnings(&state.db_pool, rider_id, month_start(Utc::now().date_naive())).await?;
  Ok(ok(earnings))
}

// --- Merchant side ---

#[derive(Debug, Deserialize)]
pub struct MerchantOrdersRequest {
  pub store_id: i64,
  pub status: Option<i16>,
  #[serde(flatten)]
  pub page: PageQuery,
}

pub async fn merchant_list(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<MerchantOrdersRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let req = payload.into_inner();
  common_steps::owned_store(&state.db_pool, req.store_id, merchant_id).await?;
  let filter = OrderFilter {
    store_id: Some(req.store_id),
    status: req.status,
    ..Default::default()
  };
  let page = db::orders::list(&state.db_pool, &filter, req.page.request()?).await?;
  Ok(ok(page))
}

#[derive(Debug, Deserialize)]
pub struct MerchantUpdateRequest {
  pub order_id: i64,
  pub new_status: i16,
  pub cancel_reason: Option<String>,
}

#[instrument(
  name = "handler::merchant_update_order",
  skip_all,
  fields(merchant_id = auth.id(), order_id = payload.order_id, target = payload.new_status)
)]
pub async fn merchant_update(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<MerchantUpdateRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let req = payload.into_inner();
  let order = db::orders::find_by_id(&state.db_pool, req.order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(ORDER_NOT_FOUND.to_string()))?;
  common_steps::owned_store(&state.db_pool, order.store_id, merchant_id).await?;

  let from = order.order_status()?;
  let to = OrderStatus::try_from(req.new_status)?;
  let reason = trimmed(req.cancel_reason);
  check_merchant_update(from, to, reason.as_deref())?;

  let mut tx = state.db_pool.begin().await?;
  let reason = reason.filter(|_| to == OrderStatus::Cancelled);
  if !db::orders::transition(&mut *tx, order.id, from, to, reason.as_deref()).await? {
    return Err(AppError::Conflict(ORDER_CHANGED.to_string()));
  }
  if let (OrderStatus::Cancelled, Some(rider_id)) = (to, order.rider_id) {
    db::riders::settle_state(&mut *tx, rider_id).await?;
  }
  let updated = db::orders::find_by_id(&mut *tx, order.id).await?;
  tx.commit().await?;
  info!(from = from.code(), to = to.code(), "Order updated by merchant.");
  Ok(ok(updated))
}

#[cfg(test)]
mod tests {
  use super::month_start;
  use chrono::NaiveDate;

  #[test]
  fn month_start_is_the_first_at_midnight() {
    let today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    assert_eq!(month_start(today).to_rfc3339(), "2024-02-01T00:00:00+00:00");
  }
}
