// server/src/web/handlers/user_handlers.rs

use actix_web::{web, HttpResponse};
use baoleme_core::domain::review::{ensure_rating, join_images};
use baoleme_core::domain::{ListingStatus, OrderStatus, Role};
use baoleme_core::validation::PHONE_RE;
use baoleme_core::ContextData;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::{not_blank, reissue_token, run_pipeline, sign_in, sign_up, trimmed, validated, PageQuery};
use crate::db;
use crate::db::orders::OrderFilter;
use crate::db::reviews::NewReview;
use crate::db::stores::StoreFilter;
use crate::db::users::UserChanges;
use crate::errors::AppError;
use crate::models::{OrderItemDetail, Store};
use crate::pipelines::common_steps;
use crate::pipelines::contexts::{PlaceOrderCtxData, RequestedLine, SignupForm};
use crate::services::auth_service;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedPrincipal;
use crate::web::response::{ok, ok_message};

// --- Account ---

#[derive(Debug, Deserialize, Validate)]
pub struct UserRegisterRequest {
  #[validate(length(min = 2, max = 20, message = "用户名长度应为2~20个字符"))]
  #[validate(custom(function = "not_blank", message = "用户名不能为空"))]
  pub username: String,
  #[validate(length(min = 6, max = 20, message = "密码长度应为6~20个字符"))]
  pub password: String,
  #[validate(regex(path = *PHONE_RE, message = "手机号格式不合法"))]
  pub phone: String,
  pub gender: Option<String>,
  #[validate(length(max = 255, message = "简介过长"))]
  pub description: Option<String>,
  pub location: Option<String>,
  pub avatar: Option<String>,
}

#[instrument(name = "handler::user_register", skip(state, payload), fields(username = %payload.username))]
pub async fn register(state: web::Data<AppState>, payload: web::Json<UserRegisterRequest>) -> Result<HttpResponse, AppError> {
  let req = validated(payload.into_inner())?;
  let form = SignupForm {
    username: req.username.trim().to_string(),
    password: req.password,
    phone: req.phone,
    gender: trimmed(req.gender),
    description: trimmed(req.description),
    location: trimmed(req.location),
    avatar: trimmed(req.avatar),
  };
  let (username, phone) = (form.username.clone(), form.phone.clone());
  let user_id = sign_up(&state, Role::User, form).await?;
  info!(user_id, "User registered.");
  Ok(ok(json!({ "user_id": user_id, "username": username, "phone": phone })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PhoneLoginRequest {
  #[validate(regex(path = *PHONE_RE, message = "手机号格式不合法"))]
  pub phone: String,
  #[validate(length(min = 1, message = "密码不能为空"))]
  pub password: String,
}

#[instrument(name = "handler::user_login", skip(state, payload))]
pub async fn login(state: web::Data<AppState>, payload: web::Json<PhoneLoginRequest>) -> Result<HttpResponse, AppError> {
  let req = validated(payload.into_inner())?;
  let session = sign_in(&state, Role::User, req.phone, req.password).await?;
  Ok(ok(session))
}

#[instrument(name = "handler::user_logout", skip_all, fields(user_id = auth.id()))]
pub async fn logout(state: web::Data<AppState>, auth: AuthenticatedPrincipal) -> Result<HttpResponse, AppError> {
  auth.require(Role::User)?;
  state.sessions.close(&auth.token);
  Ok(ok_message("登出成功"))
}

#[instrument(name = "handler::user_info", skip_all, fields(user_id = auth.id()))]
pub async fn info(state: web::Data<AppState>, auth: AuthenticatedPrincipal) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  let user = db::users::find_by_id(&state.db_pool, user_id)
    .await?
    .ok_or_else(|| AppError::NotFound("用户不存在".to_string()))?;
  Ok(ok(user))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserUpdateRequest {
  #[validate(length(min = 2, max = 20, message = "用户名长度应为2~20个字符"))]
  pub username: Option<String>,
  #[validate(length(min = 6, max = 20, message = "密码长度应为6~20个字符"))]
  pub password: Option<String>,
  #[validate(regex(path = *PHONE_RE, message = "手机号格式不合法"))]
  pub phone: Option<String>,
  pub gender: Option<String>,
  #[validate(length(max = 255, message = "简介过长"))]
  pub description: Option<String>,
  pub location: Option<String>,
  pub avatar: Option<String>,
}

#[instrument(name = "handler::user_update", skip_all, fields(user_id = auth.id()))]
pub async fn update(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<UserUpdateRequest>,
) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  let req = validated(payload.into_inner())?;
  let username = trimmed(req.username);
  let phone = trimmed(req.phone);
  common_steps::ensure_unique_identity(&state.db_pool, Role::User, username.as_deref(), phone.as_deref(), Some(user_id))
    .await?;

  let password_hash = match trimmed(req.password) {
    Some(password) => Some(auth_service::hash_password(&password)?),
    None => None,
  };
  let renamed = username.as_deref().filter(|name| *name != auth.username).map(str::to_string);
  let user = db::users::update(
    &state.db_pool,
    user_id,
    UserChanges {
      username,
      password_hash,
      phone,
      gender: trimmed(req.gender),
      description: trimmed(req.description),
      location: trimmed(req.location),
      avatar: trimmed(req.avatar),
    },
  )
  .await?
  .ok_or_else(|| AppError::NotFound("用户不存在".to_string()))?;

  let token = match renamed {
    Some(name) => Some(reissue_token(&state, &auth, &name)?),
    None => None,
  };
  Ok(ok(json!({ "user": user, "token": token })))
}

/// Carts, favorites and browse history go with the account.
#[instrument(name = "handler::user_delete", skip_all, fields(user_id = auth.id()))]
pub async fn delete(state: web::Data<AppState>, auth: AuthenticatedPrincipal) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  if !db::users::delete(&state.db_pool, user_id).await? {
    return Err(AppError::NotFound("用户不存在".to_string()));
  }
  state.sessions.close_principal(auth.principal);
  warn!(user_id, "User account deleted.");
  Ok(ok_message("账号已注销"))
}

// --- Favorites and browsing ---

#[derive(Debug, Deserialize)]
pub struct StoreIdRequest {
  pub store_id: i64,
}

pub async fn add_favorite(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<StoreIdRequest>,
) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  require_store(&state, payload.store_id).await?;
  if !db::favorites::add(&state.db_pool, user_id, payload.store_id).await? {
    return Err(AppError::Conflict("已收藏该店铺".to_string()));
  }
  Ok(ok_message("收藏成功"))
}

pub async fn remove_favorite(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<StoreIdRequest>,
) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  if !db::favorites::remove(&state.db_pool, user_id, payload.store_id).await? {
    return Err(AppError::NotFound("未收藏该店铺".to_string()));
  }
  Ok(ok_message("已取消收藏"))
}

#[derive(Debug, Deserialize)]
pub struct StoreQueryRequest {
  #[serde(flatten)]
  pub filter: StoreFilter,
  /// Accepted for compatibility and ignored.
  #[allow(dead_code)]
  pub distance: Option<Decimal>,
  #[serde(flatten)]
  pub page: PageQuery,
}

pub async fn watch_favorites(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<StoreQueryRequest>,
) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  let req = payload.into_inner();
  let page = db::stores::list_favorites(&state.db_pool, user_id, &req.filter, req.page.request()?).await?;
  Ok(ok(page))
}

#[instrument(name = "handler::user_search", skip_all, fields(user_id = auth.id()))]
pub async fn search(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<StoreQueryRequest>,
) -> Result<HttpResponse, AppError> {
  auth.require(Role::User)?;
  let req = payload.into_inner();
  let keyword = trimmed(req.filter.keyword.clone()).ok_or_else(|| AppError::Validation("关键词不能为空".to_string()))?;
  let filter = StoreFilter {
    keyword: Some(keyword),
    ..req.filter
  };
  let page = db::stores::search_open(&state.db_pool, &filter, req.page.request()?).await?;
  Ok(ok(page))
}

#[derive(Debug, Deserialize)]
pub struct OpenStoresRequest {
  #[serde(rename = "type")]
  pub store_type: Option<String>,
  #[serde(flatten)]
  pub page: PageQuery,
}

pub async fn open_stores(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<OpenStoresRequest>,
) -> Result<HttpResponse, AppError> {
  auth.require(Role::User)?;
  let req = payload.into_inner();
  let page = db::stores::list_open(&state.db_pool, trimmed(req.store_type), req.page.request()?).await?;
  Ok(ok(page))
}

#[derive(Debug, Deserialize)]
pub struct StoreProductsRequest {
  pub store_id: i64,
  pub category: Option<String>,
  #[serde(flatten)]
  pub page: PageQuery,
}

pub async fn store_products(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<StoreProductsRequest>,
) -> Result<HttpResponse, AppError> {
  auth.require(Role::User)?;
  let req = payload.into_inner();
  let store = require_store(&state, req.store_id).await?;
  if !ListingStatus::try_from(store.status)?.is_open() {
    return Err(AppError::Validation("店铺已打烊".to_string()));
  }
  let page = db::products::list_by_store(&state.db_pool, store.id, trimmed(req.category), true, req.page.request()?).await?;
  Ok(ok(page))
}

#[derive(Debug, Deserialize)]
pub struct ViewHistoryUpdate {
  pub store_id: i64,
  pub view_time: Option<DateTime<Utc>>,
}

pub async fn update_view_history(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<ViewHistoryUpdate>,
) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  require_store(&state, payload.store_id).await?;
  let viewed_at = payload.view_time.unwrap_or_else(Utc::now);
  db::favorites::record_view(&state.db_pool, user_id, payload.store_id, viewed_at).await?;
  Ok(ok_message("浏览记录已更新"))
}

pub async fn view_history(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<PageQuery>,
) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  let page = db::favorites::view_history(&state.db_pool, user_id, payload.into_inner().request()?).await?;
  Ok(ok(page))
}

// --- Coupons ---

#[derive(Debug, Deserialize)]
pub struct MyCouponsRequest {
  pub store_id: Option<i64>,
}

pub async fn my_coupons(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<MyCouponsRequest>,
) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  let coupons = db::coupons::list_usable(&state.db_pool, user_id, payload.store_id, Utc::now()).await?;
  Ok(ok(coupons))
}

pub async fn store_coupons(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<StoreIdRequest>,
) -> Result<HttpResponse, AppError> {
  auth.require(Role::User)?;
  let coupons = db::coupons::list_unclaimed(&state.db_pool, payload.store_id, Utc::now()).await?;
  Ok(ok(coupons))
}

#[derive(Debug, Deserialize)]
pub struct ClaimCouponRequest {
  pub id: i64,
}

#[instrument(name = "handler::claim_coupon", skip_all, fields(user_id = auth.id(), coupon_id = payload.id))]
pub async fn claim_coupon(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<ClaimCouponRequest>,
) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  let coupon = db::coupons::find_by_id(&state.db_pool, payload.id)
    .await?
    .ok_or_else(|| AppError::NotFound("优惠券不存在".to_string()))?;
  coupon.policy()?.ensure_claimable(user_id, Utc::now())?;
  if coupon.user_id == Some(user_id) {
    return Ok(ok_message("已领取该优惠券"));
  }
  if !db::coupons::claim(&state.db_pool, coupon.id, user_id).await? {
    return Err(AppError::Conflict("优惠券已被领取".to_string()));
  }
  Ok(ok_message("领取成功"))
}

// --- Orders ---

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OrderLineRequest {
  pub product_id: i64,
  #[validate(range(min = 1, message = "商品数量必须大于0"))]
  pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PlaceOrderRequest {
  pub store_id: i64,
  #[validate(length(min = 1, message = "订单商品不能为空"))]
  #[validate(nested)]
  pub items: Vec<OrderLineRequest>,
  #[validate(custom(function = "not_blank", message = "收货地址不能为空"))]
  pub user_location: String,
  #[validate(length(max = 255, message = "备注过长"))]
  pub remark: Option<String>,
  pub coupon_id: Option<i64>,
  pub delivery_price: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct PlacedOrder {
  pub order_id: i64,
  pub total_price: Decimal,
  pub actual_price: Decimal,
  pub status: i16,
  pub store_id: i64,
  pub store_name: String,
  pub remark: Option<String>,
  pub created_at: DateTime<Utc>,
  pub items: Vec<OrderItemDetail>,
}

#[instrument(name = "handler::place_order", skip_all, fields(user_id = auth.id(), store_id = payload.store_id))]
pub async fn place_order(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  let req = validated(payload.into_inner())?;
  let ctx = ContextData::new(PlaceOrderCtxData {
    app_state: state.get_ref().clone(),
    user_id,
    store_id: req.store_id,
    items: req
      .items
      .iter()
      .map(|line| RequestedLine {
        product_id: line.product_id,
        quantity: line.quantity,
      })
      .collect(),
    user_location: req.user_location.trim().to_string(),
    remark: trimmed(req.remark),
    coupon_id: req.coupon_id,
    delivery_price: req.delivery_price.unwrap_or(Decimal::ZERO),
    store: None,
    priced_lines: Vec::new(),
    quote: None,
    order: None,
    order_items: Vec::new(),
  });
  run_pipeline(&state, ctx.clone()).await?;

  let placed = {
    let guard = ctx.read();
    let (Some(order), Some(store)) = (guard.order.clone(), guard.store.as_ref()) else {
      return Err(AppError::Internal("order pipeline finished without an order".to_string()));
    };
    PlacedOrder {
      order_id: order.id,
      total_price: order.total_price,
      actual_price: order.actual_price,
      status: order.status,
      store_id: order.store_id,
      store_name: store.name.clone(),
      remark: order.remark,
      created_at: order.created_at,
      items: guard.order_items.clone(),
    }
  };
  info!(order_id = placed.order_id, "Order placed by user.");
  Ok(ok(placed))
}

#[derive(Debug, Deserialize)]
pub struct OrderHistoryRequest {
  pub status: Option<i16>,
  pub start_time: Option<DateTime<Utc>>,
  pub end_time: Option<DateTime<Utc>>,
  #[serde(flatten)]
  pub page: PageQuery,
}

pub async fn order_history(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<OrderHistoryRequest>,
) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  let req = payload.into_inner();
  if let Some(status) = req.status {
    OrderStatus::try_from(status)?;
  }
  let filter = OrderFilter {
    user_id: Some(user_id),
    status: req.status,
    start_time: req.start_time,
    end_time: req.end_time,
    ..Default::default()
  };
  let page = db::orders::list(&state.db_pool, &filter, req.page.request()?).await?;
  Ok(ok(page))
}

pub async fn current_orders(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<PageQuery>,
) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  let page = db::orders::list_current(&state.db_pool, user_id, payload.into_inner().request()?).await?;
  Ok(ok(page))
}

#[derive(Debug, Deserialize)]
pub struct OrderIdRequest {
  pub order_id: i64,
}

pub async fn search_order(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<OrderIdRequest>,
) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  let summary = db::orders::find_summary(&state.db_pool, payload.order_id)
    .await?
    .filter(|s| s.order.user_id == user_id)
    .ok_or_else(|| AppError::NotFound("订单不存在".to_string()))?;
  Ok(ok(summary))
}

pub async fn search_order_items(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<OrderIdRequest>,
) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  db::orders::find_by_id(&state.db_pool, payload.order_id)
    .await?
    .filter(|o| o.user_id == user_id)
    .ok_or_else(|| AppError::NotFound("订单不存在".to_string()))?;
  let items = db::orders::items(&state.db_pool, payload.order_id).await?;
  Ok(ok(items))
}

// --- Reviews ---

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
  pub store_id: i64,
  pub product_id: Option<i64>,
  pub rating: Decimal,
  #[validate(length(max = 500, message = "评价内容过长"))]
  pub comment: Option<String>,
  pub images: Option<Vec<String>>,
}

#[instrument(name = "handler::submit_review", skip_all, fields(user_id = auth.id(), store_id = payload.store_id))]
pub async fn submit_review(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<ReviewRequest>,
) -> Result<HttpResponse, AppError> {
  let user_id = auth.require(Role::User)?;
  let req = validated(payload.into_inner())?;
  ensure_rating(req.rating)?;
  let store = require_store(&state, req.store_id).await?;
  if let Some(product_id) = req.product_id {
    let belongs = db::products::find_by_id(&state.db_pool, product_id)
      .await?
      .is_some_and(|p| p.store_id == store.id);
    if !belongs {
      return Err(AppError::Validation("商品不属于该店铺".to_string()));
    }
  }
  let image = join_images(req.images.as_deref().unwrap_or_default());
  let comment = trimmed(req.comment);

  let mut tx = state.db_pool.begin().await?;
  let review = db::reviews::insert(
    &mut *tx,
    NewReview {
      user_id,
      store_id: store.id,
      product_id: req.product_id,
      rating: req.rating,
      comment: comment.as_deref(),
      image: image.as_deref(),
    },
  )
  .await?;
  db::reviews::refresh_store_rating(&mut *tx, store.id).await?;
  tx.commit().await?;
  Ok(ok(json!({ "review_id": review.id })))
}

async fn require_store(state: &AppState, store_id: i64) -> Result<Store, AppError> {
  db::stores::find_by_id(&state.db_pool, store_id)
    .await?
    .ok_or_else(|| AppError::NotFound("店铺不存在".to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn order(items: serde_json::Value) -> PlaceOrderRequest {
    serde_json::from_value(json!({
      "store_id": 1,
      "items": items,
      "user_location": "一号楼",
    }))
    .unwrap()
  }

  #[test]
  fn order_needs_at_least_one_line() {
    let err = validated(order(json!([]))).unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg.contains("订单商品不能为空")));
  }

  #[test]
  fn order_lines_are_checked_one_by_one() {
    assert!(validated(order(json!([{ "product_id": 3, "quantity": 0 }]))).is_err());
    let req = validated(order(json!([{ "product_id": 3, "quantity": 2 }]))).unwrap();
    assert_eq!(req.items[0].quantity, 2);
  }
}
