// server/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use baoleme_core::domain::{round_money, Role};
use baoleme_core::ContextData;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use validator::Validate;

use super::{run_pipeline, validated};
use crate::db;
use crate::errors::AppError;
use crate::pipelines::contexts::AddToCartCtxData;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedPrincipal;
use crate::web::response::{ok, ok_message};

#[derive(Debug, Deserialize, Validate)]
pub struct CartLineRequest {
  pub product_id: i64,
  #[validate(range(min = 1, message = "商品数量必须大于0"))]
  pub quantity: i32,
}

#[instrument(
  name = "handler::add_to_cart",
  skip(state, auth, payload),
  fields(user_id = auth.id(), product_id = payload.product_id, quantity = payload.quantity)
)]
pub async fn add(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<CartLineRequest>,
) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  let req = validated(payload.into_inner())?;
  let ctx = ContextData::new(AddToCartCtxData {
    app_state: state.get_ref().clone(),
    user_id,
    product_id: req.product_id,
    quantity: req.quantity,
    updated_item: None,
  });
  run_pipeline(&state, ctx.clone()).await?;
  let item = ctx.read().updated_item.clone();
  let item = item.ok_or_else(|| AppError::Internal("cart pipeline finished without a cart line".to_string()))?;
  info!(quantity = item.quantity, "Added to cart.");
  Ok(ok(item))
}

pub async fn view(state: web::Data<AppState>, auth: AuthenticatedPrincipal) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  let lines = db::carts::lines(&state.db_pool, user_id).await?;
  let total: Decimal = round_money(lines.iter().map(|l| l.subtotal).sum());
  Ok(ok(json!({ "items": lines, "total_price": total })))
}

pub async fn update(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<CartLineRequest>,
) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  let req = validated(payload.into_inner())?;
  if !db::carts::set_quantity(&state.db_pool, user_id, req.product_id, req.quantity).await? {
    return Err(AppError::NotFound("购物车中没有该商品".to_string()));
  }
  Ok(ok_message("购物车已更新"))
}

#[derive(Debug, Deserialize)]
pub struct CartProductRequest {
  pub product_id: i64,
}

pub async fn delete_line(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<CartProductRequest>,
) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  if !db::carts::remove_line(&state.db_pool, user_id, payload.product_id).await? {
    return Err(AppError::NotFound("购物车中没有该商品".to_string()));
  }
  Ok(ok_message("已移出购物车"))
}

pub async fn clear(state: web::Data<AppState>, auth: AuthenticatedPrincipal) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  let removed = db::carts::clear(&state.db_pool, user_id).await?;
  Ok(ok(json!({ "removed": removed })))
}
