// server/src/web/handlers/review_handlers.rs

use actix_web::{web, HttpResponse};
use baoleme_core::domain::{ReviewFilter, Role};
use serde::Deserialize;
use std::str::FromStr;

use super::PageQuery;
use crate::db;
use crate::errors::AppError;
use crate::models::ReviewView;
use crate::pipelines::common_steps::owned_store;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedPrincipal;
use crate::web::response::ok;

#[derive(Debug, Deserialize)]
pub struct StoreReviewsRequest {
  pub store_id: i64,
  #[serde(flatten)]
  pub page: PageQuery,
}

pub async fn list(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<StoreReviewsRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let store = owned_store(&state.db_pool, payload.store_id, merchant_id).await?;
  let page = db::reviews::list_for_store(&state.db_pool, store.id, None, payload.page.request()?).await?;
  Ok(ok(page.map(ReviewView::from)))
}

#[derive(Debug, Deserialize)]
pub struct FilteredReviewsRequest {
  pub store_id: i64,
  #[serde(rename = "type")]
  pub filter: String,
  #[serde(flatten)]
  pub page: PageQuery,
}

/// Same as `list`, narrowed to positive, neutral, negative or illustrated reviews.
pub async fn filter(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<FilteredReviewsRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let filter = ReviewFilter::from_str(&payload.filter)?;
  let store = owned_store(&state.db_pool, payload.store_id, merchant_id).await?;
  let page = db::reviews::list_for_store(&state.db_pool, store.id, Some(filter), payload.page.request()?).await?;
  Ok(ok(page.map(ReviewView::from)))
}
