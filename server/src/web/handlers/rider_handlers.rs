// server/src/web/handlers/rider_handlers.rs

use actix_web::{web, HttpResponse};
use baoleme_core::domain::rider::ensure_can_leave;
use baoleme_core::domain::{DispatchMode, RiderState, Role};
use baoleme_core::validation::PHONE_RE;
use baoleme_core::ContextData;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::{not_blank, reissue_token, run_pipeline, sign_in, sign_up, trimmed, validated};
use crate::db;
use crate::db::riders::RiderChanges;
use crate::errors::AppError;
use crate::pipelines::common_steps;
use crate::pipelines::contexts::{AutoDispatchCtxData, SignupForm};
use crate::services::auth_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedPrincipal;
use crate::web::response::{ok, ok_message};

#[derive(Debug, Deserialize, Validate)]
pub struct RiderRegisterRequest {
  #[validate(length(min = 2, max = 20, message = "用户名长度应为2~20个字符"))]
  #[validate(custom(function = "not_blank", message = "用户名不能为空"))]
  pub username: String,
  #[validate(length(min = 6, max = 20, message = "密码长度应为6~20个字符"))]
  pub password: String,
  #[validate(regex(path = *PHONE_RE, message = "手机号格式不合法"))]
  pub phone: String,
  pub avatar: Option<String>,
}

#[instrument(name = "handler::rider_register", skip(state, payload), fields(username = %payload.username))]
pub async fn register(state: web::Data<AppState>, payload: web::Json<RiderRegisterRequest>) -> Result<HttpResponse, AppError> {
  let req = validated(payload.into_inner())?;
  let form = SignupForm {
    username: req.username.trim().to_string(),
    password: req.password,
    phone: req.phone,
    avatar: trimmed(req.avatar),
    ..Default::default()
  };
  let (username, phone) = (form.username.clone(), form.phone.clone());
  let rider_id = sign_up(&state, Role::Rider, form).await?;
  info!(rider_id, "Rider registered.");
  Ok(ok(json!({ "id": rider_id, "username": username, "phone": phone })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RiderLoginRequest {
  #[validate(regex(path = *PHONE_RE, message = "手机号格式不合法"))]
  pub phone: String,
  #[validate(length(min = 1, message = "密码不能为空"))]
  pub password: String,
}

#[instrument(name = "handler::rider_login", skip(state, payload))]
pub async fn login(state: web::Data<AppState>, payload: web::Json<RiderLoginRequest>) -> Result<HttpResponse, AppError> {
  let req = validated(payload.into_inner())?;
  let session = sign_in(&state, Role::Rider, req.phone, req.password).await?;
  Ok(ok(session))
}

/// Ends the session and takes the rider offline.
#[instrument(name = "handler::rider_logout", skip_all, fields(rider_id = auth.id()))]
pub async fn logout(state: web::Data<AppState>, auth: AuthenticatedPrincipal) -> Result<HttpResponse, AppError> {
  let rider_id = auth.require(Role::Rider)?;
  db::riders::set_state(&state.db_pool, rider_id, RiderState::Offline).await?;
  state.sessions.close(&auth.token);
  Ok(ok_message("登出成功"))
}

pub async fn info(state: web::Data<AppState>, auth: AuthenticatedPrincipal) -> Result<HttpResponse, AppError> {
  let rider_id = auth.require(Role::Rider)?;
  let rider = db::riders::find_by_id(&state.db_pool, rider_id)
    .await?
    .ok_or_else(|| AppError::NotFound("骑手不存在".to_string()))?;
  Ok(ok(rider))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RiderUpdateRequest {
  #[validate(length(min = 2, max = 20, message = "用户名长度应为2~20个字符"))]
  pub username: Option<String>,
  #[validate(length(min = 6, max = 20, message = "密码长度应为6~20个字符"))]
  pub password: Option<String>,
  #[validate(regex(path = *PHONE_RE, message = "手机号格式不合法"))]
  pub phone: Option<String>,
  pub avatar: Option<String>,
  pub dispatch_mode: Option<i16>,
}

#[instrument(name = "handler::rider_update", skip_all, fields(rider_id = auth.id()))]
pub async fn update(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<RiderUpdateRequest>,
) -> Result<HttpResponse, AppError> {
  let rider_id = auth.require(Role::Rider)?;
  let req = validated(payload.into_inner())?;
  let dispatch_mode = req.dispatch_mode.map(DispatchMode::try_from).transpose()?;
  let username = trimmed(req.username);
  let phone = trimmed(req.phone);
  common_steps::ensure_unique_identity(&state.db_pool, Role::Rider, username.as_deref(), phone.as_deref(), Some(rider_id))
    .await?;
  let password_hash = match trimmed(req.password) {
    Some(password) => Some(auth_service::hash_password(&password)?),
    None => None,
  };
  let renamed = username.as_deref().filter(|name| *name != auth.username).map(str::to_string);

  let rider = db::riders::update(
    &state.db_pool,
    rider_id,
    RiderChanges {
      username,
      password_hash,
      phone,
      avatar: trimmed(req.avatar),
      dispatch_mode,
    },
  )
  .await?
  .ok_or_else(|| AppError::NotFound("骑手不存在".to_string()))?;

  let token = match renamed {
    Some(name) => Some(reissue_token(&state, &auth, &name)?),
    None => None,
  };
  Ok(ok(json!({ "rider": rider, "token": token })))
}

/// Deletes a rider that holds no accepted or delivering order.
pub(crate) async fn remove_rider(state: &AppState, rider_id: i64) -> Result<bool, AppError> {
  let mut tx = state.db_pool.begin().await?;
  if !db::riders::lock(&mut *tx, rider_id).await? {
    return Ok(false);
  }
  let active = db::riders::active_order_count(&mut *tx, rider_id).await?;
  ensure_can_leave(active)?;
  let removed = db::riders::delete(&mut *tx, rider_id).await?;
  tx.commit().await?;
  Ok(removed)
}

pub async fn delete(state: web::Data<AppState>, auth: AuthenticatedPrincipal) -> Result<HttpResponse, AppError> {
  let rider_id = auth.require(Role::Rider)?;
  if !remove_rider(&state, rider_id).await? {
    return Err(AppError::NotFound("骑手不存在".to_string()));
  }
  state.sessions.close_principal(auth.principal);
  warn!(rider_id, "Rider account deleted.");
  Ok(ok_message("账号已注销"))
}

#[derive(Debug, Deserialize)]
pub struct DispatchModeRequest {
  pub dispatch_mode: i16,
}

pub async fn set_dispatch_mode(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<DispatchModeRequest>,
) -> Result<HttpResponse, AppError> {
  let rider_id = auth.require(Role::Rider)?;
  let mode = DispatchMode::try_from(payload.dispatch_mode)?;
  db::riders::set_dispatch_mode(&state.db_pool, rider_id, mode).await?;
  Ok(ok(json!({ "dispatch_mode": mode })))
}

#[instrument(name = "handler::auto_order_taking", skip_all, fields(rider_id = auth.id()))]
pub async fn auto_order_taking(state: web::Data<AppState>, auth: AuthenticatedPrincipal) -> Result<HttpResponse, AppError> {
  let rider_id = auth.require(Role::Rider)?;
  let ctx = ContextData::new(AutoDispatchCtxData {
    app_state: state.get_ref().clone(),
    rider_id,
    rider: None,
    order: None,
  });
  run_pipeline(&state, ctx.clone()).await?;
  let order = ctx.read().order.clone();
  let order = order.ok_or_else(|| AppError::Internal("dispatch finished without an order".to_string()))?;
  info!(order_id = order.id, "Order dispatched automatically.");
  Ok(ok(order))
}
