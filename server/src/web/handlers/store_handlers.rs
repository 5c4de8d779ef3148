// server/src/web/handlers/store_handlers.rs

use actix_web::{web, HttpResponse};
use baoleme_core::domain::{ListingStatus, Role};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::{not_blank, trimmed, validated, PageQuery};
use crate::db;
use crate::db::stores::{NewStore, StoreChanges};
use crate::errors::AppError;
use crate::pipelines::common_steps::owned_store;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedPrincipal;
use crate::web::response::{ok, ok_message};

const STORE_NAME_TAKEN: &str = "店铺名称已存在";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStoreRequest {
  #[validate(length(max = 50, message = "店铺名称不能超过50个字符"))]
  #[validate(custom(function = "not_blank", message = "店铺名称不能为空"))]
  pub name: String,
  #[validate(length(max = 255, message = "店铺简介过长"))]
  pub description: Option<String>,
  pub location: Option<String>,
  #[serde(rename = "type")]
  pub store_type: Option<String>,
  pub image: Option<String>,
}

#[instrument(name = "handler::create_store", skip_all, fields(merchant_id = auth.id()))]
pub async fn create(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<CreateStoreRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let req = validated(payload.into_inner())?;
  let name = req.name.trim().to_string();
  if db::stores::name_taken(&state.db_pool, &name, None).await? {
    return Err(AppError::Conflict(STORE_NAME_TAKEN.to_string()));
  }
  let (description, location, store_type, image) = (
    trimmed(req.description),
    trimmed(req.location),
    trimmed(req.store_type),
    trimmed(req.image),
  );
  let store = db::stores::insert(
    &state.db_pool,
    NewStore {
      merchant_id,
      name: &name,
      description: description.as_deref(),
      location: location.as_deref(),
      store_type: store_type.as_deref(),
      image: image.as_deref(),
    },
  )
  .await?;
  info!(store_id = store.id, "Store created.");
  Ok(ok(json!({ "store_id": store.id })))
}

pub async fn list(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<PageQuery>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let page = db::stores::list_by_merchant(&state.db_pool, merchant_id, payload.into_inner().request()?).await?;
  Ok(ok(page))
}

#[derive(Debug, Deserialize)]
pub struct StoreIdRequest {
  pub store_id: i64,
}

pub async fn view(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<StoreIdRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let store = owned_store(&state.db_pool, payload.store_id, merchant_id).await?;
  Ok(ok(store))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStoreRequest {
  pub store_id: i64,
  #[validate(length(min = 1, max = 50, message = "店铺名称长度应为1~50个字符"))]
  pub name: Option<String>,
  #[validate(length(max = 255, message = "店铺简介过长"))]
  pub description: Option<String>,
  pub location: Option<String>,
  #[serde(rename = "type")]
  pub store_type: Option<String>,
  pub image: Option<String>,
}

#[instrument(name = "handler::update_store", skip_all, fields(merchant_id = auth.id(), store_id = payload.store_id))]
pub async fn update(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<UpdateStoreRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let req = validated(payload.into_inner())?;
  let store = owned_store(&state.db_pool, req.store_id, merchant_id).await?;
  let name = trimmed(req.name);
  if let Some(name) = &name {
    if db::stores::name_taken(&state.db_pool, name, Some(store.id)).await? {
      return Err(AppError::Conflict(STORE_NAME_TAKEN.to_string()));
    }
  }
  let updated = db::stores::update(
    &state.db_pool,
    store.id,
    StoreChanges {
      name,
      description: trimmed(req.description),
      location: trimmed(req.location),
      store_type: trimmed(req.store_type),
      image: trimmed(req.image),
    },
  )
  .await?
  .ok_or_else(|| AppError::NotFound("店铺不存在".to_string()))?;
  Ok(ok(updated))
}

#[derive(Debug, Deserialize)]
pub struct StoreStatusRequest {
  pub store_id: i64,
  pub status: i16,
}

pub async fn set_status(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<StoreStatusRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let status = ListingStatus::try_from(payload.status)?;
  let store = owned_store(&state.db_pool, payload.store_id, merchant_id).await?;
  db::stores::set_status(&state.db_pool, store.id, status).await?;
  Ok(ok(json!({ "store_id": store.id, "status": status.code() })))
}

#[instrument(name = "handler::delete_store", skip_all, fields(merchant_id = auth.id(), store_id = payload.store_id))]
pub async fn delete(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<StoreIdRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let store = owned_store(&state.db_pool, payload.store_id, merchant_id).await?;
  db::stores::delete(&state.db_pool, store.id).await?;
  warn!("Store deleted with its products and orders.");
  Ok(ok_message("店铺已删除"))
}

/// Public store card, readable by every role.
pub async fn store_info(
  state: web::Data<AppState>,
  _auth: AuthenticatedPrincipal,
  payload: web::Json<StoreIdRequest>,
) -> Result<HttpResponse, AppError> {
  let store = db::stores::find_by_id(&state.db_pool, payload.store_id)
    .await?
    .ok_or_else(|| AppError::NotFound("店铺不存在".to_string()))?;
  Ok(ok(store))
}
