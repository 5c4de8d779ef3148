// server/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use baoleme_core::domain::{ListingStatus, Role};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use validator::{Validate, ValidationError};

use super::{not_blank, trimmed, validated, PageQuery};
use crate::db;
use crate::db::products::{NewProduct, ProductChanges};
use crate::errors::AppError;
use crate::models::Product;
use crate::pipelines::common_steps::owned_store;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedPrincipal;
use crate::web::response::{ok, ok_message};

const PRODUCT_NOT_FOUND: &str = "商品不存在";

fn positive_price(price: &Decimal) -> Result<(), ValidationError> {
  if *price <= Decimal::ZERO {
    return Err(ValidationError::new("price"));
  }
  Ok(())
}

/// Loads a product and checks that its store belongs to `merchant_id`.
async fn owned_product(state: &AppState, product_id: i64, merchant_id: i64) -> Result<Product, AppError> {
  let product = db::products::find_by_id(&state.db_pool, product_id)
    .await?
    .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;
  owned_store(&state.db_pool, product.store_id, merchant_id).await?;
  Ok(product)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
  pub store_id: i64,
  #[validate(length(max = 50, message = "商品名称不能超过50个字符"))]
  #[validate(custom(function = "not_blank", message = "商品名称不能为空"))]
  pub name: String,
  #[validate(custom(function = "positive_price", message = "价格必须大于0"))]
  pub price: Decimal,
  #[validate(length(max = 255, message = "商品描述过长"))]
  pub description: Option<String>,
  pub category: Option<String>,
  #[serde(default)]
  #[validate(range(min = 0, message = "库存不能为负数"))]
  pub stock: i32,
  pub image: Option<String>,
}

#[instrument(name = "handler::create_product", skip_all, fields(merchant_id = auth.id(), store_id = payload.store_id))]
pub async fn create(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let req = validated(payload.into_inner())?;
  let store = owned_store(&state.db_pool, req.store_id, merchant_id).await?;
  let name = req.name.trim().to_string();
  if db::products::find_in_store_by_name(&state.db_pool, store.id, &name).await?.is_some() {
    return Err(AppError::Conflict("该店铺已有同名商品".to_string()));
  }
  let (description, category, image) = (trimmed(req.description), trimmed(req.category), trimmed(req.image));
  let product = db::products::insert(
    &state.db_pool,
    NewProduct {
      store_id: store.id,
      name: &name,
      description: description.as_deref(),
      price: req.price,
      category: category.as_deref(),
      stock: req.stock,
      image: image.as_deref(),
    },
  )
  .await?;
  info!(product_id = product.id, "Product created.");
  Ok(ok(json!({ "product_id": product.id })))
}

#[derive(Debug, Deserialize)]
pub struct ProductIdRequest {
  pub product_id: i64,
}

pub async fn view(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<ProductIdRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let product = owned_product(&state, payload.product_id, merchant_id).await?;
  Ok(ok(product))
}

#[derive(Debug, Deserialize)]
pub struct StoreProductsRequest {
  pub store_id: i64,
  pub category: Option<String>,
  #[serde(flatten)]
  pub page: PageQuery,
}

/// Every product of an owned store, withdrawn ones included.
pub async fn store_products(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<StoreProductsRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let req = payload.into_inner();
  let store = owned_store(&state.db_pool, req.store_id, merchant_id).await?;
  let page = db::products::list_by_store(&state.db_pool, store.id, trimmed(req.category), false, req.page.request()?).await?;
  Ok(ok(page))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
  pub product_id: i64,
  #[validate(length(min = 1, max = 50, message = "商品名称长度应为1~50个字符"))]
  pub name: Option<String>,
  #[validate(length(max = 255, message = "商品描述过长"))]
  pub description: Option<String>,
  #[validate(custom(function = "positive_price", message = "价格必须大于0"))]
  pub price: Option<Decimal>,
  pub category: Option<String>,
  #[validate(range(min = 0, message = "库存不能为负数"))]
  pub stock: Option<i32>,
  pub image: Option<String>,
}

#[instrument(name = "handler::update_product", skip_all, fields(merchant_id = auth.id(), product_id = payload.product_id))]
pub async fn update(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let req = validated(payload.into_inner())?;
  let product = owned_product(&state, req.product_id, merchant_id).await?;
  let name = trimmed(req.name);
  if let Some(name) = &name {
    let clash = db::products::find_in_store_by_name(&state.db_pool, product.store_id, name).await?;
    if clash.is_some_and(|other| other.id != product.id) {
      return Err(AppError::Conflict("该店铺已有同名商品".to_string()));
    }
  }
  let updated = db::products::update(
    &state.db_pool,
    product.id,
    ProductChanges {
      name,
      description: trimmed(req.description),
      price: req.price,
      category: trimmed(req.category),
      stock: req.stock,
      image: trimmed(req.image),
    },
  )
  .await?
  .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;
  Ok(ok(updated))
}

#[derive(Debug, Deserialize)]
pub struct ProductStatusRequest {
  pub product_id: i64,
  pub status: i16,
}

pub async fn set_status(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<ProductStatusRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let status = ListingStatus::try_from(payload.status)?;
  let product = owned_product(&state, payload.product_id, merchant_id).await?;
  db::products::set_status(&state.db_pool, product.id, status).await?;
  Ok(ok(json!({ "product_id": product.id, "status": status.code() })))
}

pub async fn delete(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<ProductIdRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let product = owned_product(&state, payload.product_id, merchant_id).await?;
  db::products::delete(&state.db_pool, product.id).await?;
  info!(product_id = product.id, "Product deleted.");
  Ok(ok_message("商品已删除"))
}

/// Product card for any signed-in role, with its lifetime sales volume.
pub async fn product_info(
  state: web::Data<AppState>,
  _auth: AuthenticatedPrincipal,
  payload: web::Json<ProductIdRequest>,
) -> Result<HttpResponse, AppError> {
  let product = db::products::find_by_id(&state.db_pool, payload.product_id)
    .await?
    .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))?;
  let volume = db::sales::product_volume(&state.db_pool, product.id).await?;
  Ok(ok(json!({ "product": product, "volume": volume })))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn price_must_be_positive() {
    assert!(positive_price(&Decimal::new(1, 2)).is_ok());
    assert!(positive_price(&Decimal::ZERO).is_err());
    assert!(positive_price(&Decimal::new(-5, 0)).is_err());
  }
}
