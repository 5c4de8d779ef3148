// server/src/web/handlers/admin_handlers.rs

//! Platform administration: account and catalog listings, removals and lookups.

use actix_web::{web, HttpResponse};
use baoleme_core::domain::Role;
use baoleme_core::RuleViolation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};
use validator::Validate;

use super::rider_handlers::remove_rider;
use super::{not_blank, sign_in, trimmed, validated, PageQuery};
use crate::db;
use crate::db::merchants::MerchantFilter;
use crate::db::orders::OrderFilter;
use crate::db::reviews::AdminReviewFilter;
use crate::db::riders::RiderFilter;
use crate::db::stores::{CatalogHit, StoreFilter};
use crate::db::users::UserFilter;
use crate::errors::AppError;
use crate::models::ReviewView;
use crate::services::session_registry::{Principal, SessionRegistry};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedPrincipal;
use crate::web::response::{ok, ok_message};

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
  pub admin_id: i64,
  pub password: String,
}

#[instrument(name = "handler::admin_login", skip_all, fields(admin_id = payload.admin_id))]
pub async fn login(state: web::Data<AppState>, payload: web::Json<AdminLoginRequest>) -> Result<HttpResponse, AppError> {
  let req = payload.into_inner();
  let session = sign_in(&state, Role::Admin, req.admin_id.to_string(), req.password).await?;
  Ok(ok(session))
}

pub async fn logout(state: web::Data<AppState>, auth: AuthenticatedPrincipal) -> Result<HttpResponse, AppError> {
  auth.require(Role::Admin)?;
  state.sessions.close(&auth.token);
  Ok(ok_message("登出成功"))
}

/// A list filter plus paging, both read from the same JSON object.
#[derive(Debug, Deserialize)]
pub struct Listing<F> {
  #[serde(flatten)]
  pub filter: F,
  #[serde(flatten)]
  pub page: PageQuery,
}

pub async fn user_list(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<Listing<UserFilter>>,
) -> Result<HttpResponse, AppError> {
  auth.require(Role::Admin)?;
  let page = db::users::list(&state.db_pool, &payload.filter, payload.page.request()?).await?;
  Ok(ok(page))
}

pub async fn rider_list(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<Listing<RiderFilter>>,
) -> Result<HttpResponse, AppError> {
  auth.require(Role::Admin)?;
  let page = db::riders::list(&state.db_pool, &payload.filter, payload.page.request()?).await?;
  Ok(ok(page))
}

pub async fn merchant_list(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<Listing<MerchantFilter>>,
) -> Result<HttpResponse, AppError> {
  auth.require(Role::Admin)?;
  let page = db::merchants::list(&state.db_pool, &payload.filter, payload.page.request()?).await?;
  Ok(ok(page))
}

pub async fn store_list(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<Listing<StoreFilter>>,
) -> Result<HttpResponse, AppError> {
  auth.require(Role::Admin)?;
  let page = db::stores::list_all(&state.db_pool, &payload.filter, payload.page.request()?).await?;
  Ok(ok(page))
}

#[derive(Debug, Deserialize)]
pub struct ProductListFilter {
  pub store_id: i64,
}

pub async fn product_list(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<Listing<ProductListFilter>>,
) -> Result<HttpResponse, AppError> {
  auth.require(Role::Admin)?;
  let page =
    db::products::list_by_store(&state.db_pool, payload.filter.store_id, None, false, payload.page.request()?).await?;
  Ok(ok(page))
}

pub async fn order_list(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<Listing<OrderFilter>>,
) -> Result<HttpResponse, AppError> {
  auth.require(Role::Admin)?;
  let page = db::orders::list(&state.db_pool, &payload.filter, payload.page.request()?).await?;
  Ok(ok(page))
}

pub async fn review_list(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<Listing<AdminReviewFilter>>,
) -> Result<HttpResponse, AppError> {
  auth.require(Role::Admin)?;
  let page = db::reviews::list(&state.db_pool, &payload.filter, payload.page.request()?).await?;
  Ok(ok(page.map(ReviewView::from)))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteTargets {
  pub user_name: Option<String>,
  pub rider_name: Option<String>,
  pub merchant_name: Option<String>,
  pub store_name: Option<String>,
  pub product_name: Option<String>,
}

impl DeleteTargets {
  fn normalized(self) -> Result<Self, AppError> {
    let targets = Self {
      user_name: trimmed(self.user_name),
      rider_name: trimmed(self.rider_name),
      merchant_name: trimmed(self.merchant_name),
      store_name: trimmed(self.store_name),
      product_name: trimmed(self.product_name),
    };
    if targets.user_name.is_none()
      && targets.rider_name.is_none()
      && targets.merchant_name.is_none()
      && targets.store_name.is_none()
      && targets.product_name.is_none()
    {
      return Err(AppError::Validation("至少需要指定一个删除对象".to_string()));
    }
    if targets.product_name.is_some() && targets.store_name.is_none() {
      return Err(AppError::Validation("删除商品必须同时提供所属店铺名".to_string()));
    }
    Ok(targets)
  }
}

/// A removed account must not keep a live token.
fn close_if_removed(sessions: &SessionRegistry, removed: bool, role: Role, id: i64) -> bool {
  if removed {
    sessions.close_principal(Principal::new(role, id));
  }
  removed
}

/// A business rule keeping the target is a failed target, not a failed call.
fn refused_as_kept(result: Result<bool, AppError>, refusal: &mut Option<RuleViolation>) -> Result<bool, AppError> {
  match result {
    Err(AppError::Rule(reason)) => {
      warn!(%reason, "Delete target kept.");
      *refusal = Some(reason);
      Ok(false)
    }
    other => other,
  }
}

#[derive(Debug, Default, Serialize)]
pub struct DeleteReport {
  pub deleted: Vec<String>,
  pub failed: Vec<String>,
}

/// Removes accounts, a store, or a product of a named store.
///
/// With a product name the store name only locates the product; the store
/// itself is kept. Every target is attempted and failures are reported
/// together. The call fails only when nothing was removed.
#[instrument(name = "handler::admin_delete", skip_all)]
pub async fn delete(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<DeleteTargets>,
) -> Result<HttpResponse, AppError> {
  auth.require(Role::Admin)?;
  let targets = payload.into_inner().normalized()?;
  let pool = &state.db_pool;
  let mut report = DeleteReport::default();
  let mut refusal = None;

  if let Some(name) = &targets.user_name {
    let removed = match db::users::find_by_username(pool, name).await? {
      Some(user) => close_if_removed(&state.sessions, db::users::delete(pool, user.id).await?, Role::User, user.id),
      None => false,
    };
    record(&mut report, removed, format!("用户 {}", name));
  }
  if let Some(name) = &targets.rider_name {
    let removed = match db::riders::find_by_username(pool, name).await? {
      Some(rider) => {
        let removed = refused_as_kept(remove_rider(&state, rider.id).await, &mut refusal)?;
        close_if_removed(&state.sessions, removed, Role::Rider, rider.id)
      }
      None => false,
    };
    record(&mut report, removed, format!("骑手 {}", name));
  }
  if let Some(name) = &targets.merchant_name {
    let removed = match db::merchants::find_by_username(pool, name).await? {
      Some(merchant) => close_if_removed(&state.sessions, db::merchants::delete(pool, merchant.id).await?, Role::Merchant, merchant.id),
      None => false,
    };
    record(&mut report, removed, format!("商家 {}", name));
  }
  if let Some(store_name) = &targets.store_name {
    let store = db::stores::find_by_name(pool, store_name).await?;
    match (&targets.product_name, store) {
      (Some(product_name), Some(store)) => {
        let removed = match db::products::find_in_store_by_name(pool, store.id, product_name).await? {
          Some(product) => db::products::delete(pool, product.id).await?,
          None => false,
        };
        record(&mut report, removed, format!("商品 {}/{}", store_name, product_name));
      }
      (Some(product_name), None) => record(&mut report, false, format!("商品 {}/{}", store_name, product_name)),
      (None, Some(store)) => {
        let removed = db::stores::delete(pool, store.id).await?;
        record(&mut report, removed, format!("店铺 {}", store_name));
      }
      (None, None) => record(&mut report, false, format!("店铺 {}", store_name)),
    }
  }

  if report.deleted.is_empty() {
    if let Some(reason) = refusal {
      return Err(AppError::Rule(reason));
    }
    return Err(AppError::NotFound(format!("删除失败: {}", report.failed.join("、"))));
  }
  if !report.failed.is_empty() {
    warn!(failed = ?report.failed, "Some delete targets were not found.");
  }
  info!(deleted = ?report.deleted, "Admin delete finished.");
  Ok(ok(report))
}

fn record(report: &mut DeleteReport, removed: bool, label: String) {
  if removed {
    report.deleted.push(label);
  } else {
    report.failed.push(label);
  }
}

#[derive(Debug, Deserialize, Validate)]
pub struct KeywordRequest {
  #[validate(custom(function = "not_blank", message = "关键词不能为空"))]
  pub keyword: String,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct CatalogGroup {
  pub store_id: i64,
  pub store_name: String,
  pub products: BTreeMap<String, i64>,
}

/// Folds store/product hits into one entry per store, in first-seen order.
fn group_catalog(hits: Vec<CatalogHit>) -> Vec<CatalogGroup> {
  let mut groups: Vec<CatalogGroup> = Vec::new();
  for hit in hits {
    let index = match groups.iter().position(|g| g.store_id == hit.store_id) {
      Some(index) => index,
      None => {
        groups.push(CatalogGroup { store_id: hit.store_id, store_name: hit.store_name, products: BTreeMap::new() });
        groups.len() - 1
      }
    };
    if let (Some(id), Some(name)) = (hit.product_id, hit.product_name) {
      groups[index].products.insert(name, id);
    }
  }
  groups
}

pub async fn search(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<KeywordRequest>,
) -> Result<HttpResponse, AppError> {
  auth.require(Role::Admin)?;
  let req = validated(payload.into_inner())?;
  let hits = db::stores::search_catalog(&state.db_pool, req.keyword.trim()).await?;
  Ok(ok(group_catalog(hits)))
}

#[derive(Debug, Deserialize)]
pub struct OrderLookup {
  pub order_id: i64,
}

pub async fn search_order_by_id(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<OrderLookup>,
) -> Result<HttpResponse, AppError> {
  auth.require(Role::Admin)?;
  let order = db::orders::find_summary(&state.db_pool, payload.order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("订单不存在".to_string()))?;
  let items = db::orders::items(&state.db_pool, payload.order_id).await?;
  Ok(ok(serde_json::json!({ "order": order, "items": items })))
}

#[derive(Debug, Deserialize)]
pub struct ReviewLookup {
  pub review_id: i64,
}

pub async fn search_review_by_id(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<ReviewLookup>,
) -> Result<HttpResponse, AppError> {
  auth.require(Role::Admin)?;
  let row = db::reviews::find_row(&state.db_pool, payload.review_id)
    .await?
    .ok_or_else(|| AppError::NotFound("评价不存在".to_string()))?;
  Ok(ok(ReviewView::from(row)))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn hit(store_id: i64, store: &str, product: Option<(i64, &str)>) -> CatalogHit {
    CatalogHit {
      store_id,
      store_name: store.to_string(),
      product_id: product.map(|(id, _)| id),
      product_name: product.map(|(_, name)| name.to_string()),
    }
  }

  #[test]
  fn catalog_hits_group_by_store() {
    let groups = group_catalog(vec![
      hit(2, "面馆", Some((11, "牛肉面"))),
      hit(5, "面包房", None),
      hit(2, "面馆", Some((12, "拉面"))),
    ]);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].store_id, 2);
    assert_eq!(groups[0].products.get("拉面"), Some(&12));
    assert_eq!(groups[0].products.len(), 2);
    assert!(groups[1].products.is_empty());
  }

  #[test]
  fn product_delete_needs_store_name() {
    let err = DeleteTargets { product_name: Some("奶茶".to_string()), ..Default::default() }
      .normalized()
      .unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg.contains("所属店铺名")));
  }

  #[test]
  fn blank_targets_are_rejected() {
    let targets = DeleteTargets { user_name: Some("  ".to_string()), ..Default::default() };
    assert!(targets.normalized().is_err());
  }

  #[test]
  fn listing_reads_filter_and_paging_from_one_object() {
    let listing: Listing<UserFilter> =
      serde_json::from_str(r#"{"keyword": "li", "gender": "F", "page": 2, "page_size": 5}"#).unwrap();
    assert_eq!(listing.filter.keyword.as_deref(), Some("li"));
    assert_eq!(listing.page.page, Some(2));
  }

  #[test]
  fn removed_accounts_lose_their_session() {
    let sessions = SessionRegistry::new(chrono::Duration::hours(1));
    sessions.open(Principal::new(Role::Rider, 4), "rider-token").unwrap();
    sessions.open(Principal::new(Role::User, 4), "user-token").unwrap();

    assert!(!close_if_removed(&sessions, false, Role::User, 4));
    assert_eq!(sessions.resolve("user-token"), Some(Principal::new(Role::User, 4)));

    assert!(close_if_removed(&sessions, true, Role::Rider, 4));
    assert_eq!(sessions.resolve("rider-token"), None);
    assert_eq!(sessions.resolve("user-token"), Some(Principal::new(Role::User, 4)));
  }

  #[test]
  fn riders_with_active_orders_are_reported_not_fatal() {
    let mut refusal = None;
    let kept = refused_as_kept(Err(AppError::Rule(RuleViolation::RiderHasActiveOrders(1))), &mut refusal);
    assert!(!kept.unwrap());
    assert_eq!(refusal, Some(RuleViolation::RiderHasActiveOrders(1)));

    assert!(refused_as_kept(Ok(true), &mut refusal).unwrap());
    assert!(refused_as_kept(Err(AppError::Internal("db".to_string())), &mut refusal).is_err());
  }
}
