// server/src/web/handlers/merchant_handlers.rs

use actix_web::{web, HttpResponse};
use baoleme_core::domain::Role;
use baoleme_core::validation::PHONE_RE;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::{not_blank, reissue_token, sign_in, sign_up, trimmed, validated};
use crate::db;
use crate::db::merchants::MerchantChanges;
use crate::errors::AppError;
use crate::pipelines::common_steps;
use crate::pipelines::contexts::SignupForm;
use crate::services::auth_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedPrincipal;
use crate::web::response::{ok, ok_message};

#[derive(Debug, Deserialize, Validate)]
pub struct MerchantRegisterRequest {
  #[validate(length(min = 2, max = 20, message = "用户名长度应为2~20个字符"))]
  #[validate(custom(function = "not_blank", message = "用户名不能为空"))]
  pub username: String,
  #[validate(length(min = 6, max = 20, message = "密码长度应为6~20个字符"))]
  pub password: String,
  #[validate(regex(path = *PHONE_RE, message = "手机号格式不合法"))]
  pub phone: String,
  pub avatar: Option<String>,
}

#[instrument(name = "handler::merchant_register", skip(state, payload), fields(username = %payload.username))]
pub async fn register(
  state: web::Data<AppState>,
  payload: web::Json<MerchantRegisterRequest>,
) -> Result<HttpResponse, AppError> {
  let req = validated(payload.into_inner())?;
  let form = SignupForm {
    username: req.username.trim().to_string(),
    password: req.password,
    phone: req.phone,
    avatar: trimmed(req.avatar),
    ..Default::default()
  };
  let (username, phone) = (form.username.clone(), form.phone.clone());
  let merchant_id = sign_up(&state, Role::Merchant, form).await?;
  info!(merchant_id, "Merchant registered.");
  Ok(ok(json!({ "id": merchant_id, "username": username, "phone": phone })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct MerchantLoginRequest {
  #[validate(custom(function = "not_blank", message = "用户名不能为空"))]
  pub username: String,
  #[validate(length(min = 1, message = "密码不能为空"))]
  pub password: String,
}

#[instrument(name = "handler::merchant_login", skip(state, payload))]
pub async fn login(state: web::Data<AppState>, payload: web::Json<MerchantLoginRequest>) -> Result<HttpResponse, AppError> {
  let req = validated(payload.into_inner())?;
  let session = sign_in(&state, Role::Merchant, req.username, req.password).await?;
  Ok(ok(session))
}

pub async fn logout(state: web::Data<AppState>, auth: AuthenticatedPrincipal) -> Result<HttpResponse, AppError> {
  auth.require(Role::Merchant)?;
  state.sessions.close(&auth.token);
  Ok(ok_message("登出成功"))
}

pub async fn info(state: web::Data<AppState>, auth: AuthenticatedPrincipal) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let merchant = db::merchants::find_by_id(&state.db_pool, merchant_id)
    .await?
    .ok_or_else(|| AppError::NotFound("商家不存在".to_string()))?;
  Ok(ok(merchant))
}

#[derive(Debug, Deserialize, Validate)]
pub struct MerchantUpdateRequest {
  #[validate(length(min = 2, max = 20, message = "用户名长度应为2~20个字符"))]
  pub username: Option<String>,
  #[validate(length(min = 6, max = 20, message = "密码长度应为6~20个字符"))]
  pub password: Option<String>,
  #[validate(regex(path = *PHONE_RE, message = "手机号格式不合法"))]
  pub phone: Option<String>,
  pub avatar: Option<String>,
}

#[instrument(name = "handler::merchant_update", skip_all, fields(merchant_id = auth.id()))]
pub async fn update(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<MerchantUpdateRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let req = validated(payload.into_inner())?;
  let username = trimmed(req.username);
  let phone = trimmed(req.phone);
  common_steps::ensure_unique_identity(
    &state.db_pool,
    Role::Merchant,
    username.as_deref(),
    phone.as_deref(),
    Some(merchant_id),
  )
  .await?;
  let password_hash = match trimmed(req.password) {
    Some(password) => Some(auth_service::hash_password(&password)?),
    None => None,
  };
  let renamed = username.as_deref().filter(|name| *name != auth.username).map(str::to_string);

  let merchant = db::merchants::update(
    &state.db_pool,
    merchant_id,
    MerchantChanges {
      username,
      password_hash,
      phone,
      avatar: trimmed(req.avatar),
    },
  )
  .await?
  .ok_or_else(|| AppError::NotFound("商家不存在".to_string()))?;

  let token = match renamed {
    Some(name) => Some(reissue_token(&state, &auth, &name)?),
    None => None,
  };
  Ok(ok(json!({ "merchant": merchant, "token": token })))
}

pub async fn delete(state: web::Data<AppState>, auth: AuthenticatedPrincipal) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  if !db::merchants::delete(&state.db_pool, merchant_id).await? {
    return Err(AppError::NotFound("商家不存在".to_string()));
  }
  state.sessions.close_principal(auth.principal);
  warn!(merchant_id, "Merchant account deleted.");
  Ok(ok_message("账号已注销"))
}
