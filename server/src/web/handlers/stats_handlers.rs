// server/src/web/handlers/stats_handlers.rs

//! Sales figures for a merchant's own store.

use actix_web::{web, HttpResponse};
use baoleme_core::domain::stats::{bucket_trend, weighted_average_price, window_start};
use baoleme_core::domain::{Role, TimeRange, TrendAxis, TrendPoint};
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::db;
use crate::db::sales::ProductSales;
use crate::errors::AppError;
use crate::pipelines::common_steps::owned_store;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedPrincipal;
use crate::web::response::ok;

const POPULAR_LIMIT: i64 = 3;
const POPULAR_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct OverviewRequest {
  pub store_id: i64,
  pub time_range: TimeRange,
}

#[derive(Debug, Serialize)]
pub struct SalesOverview {
  pub total_sales: Decimal,
  pub order_count: i64,
  pub popular_products: Vec<ProductSales>,
  pub average_price: Decimal,
}

#[instrument(name = "handler::sales_overview", skip_all, fields(store_id = payload.store_id, range = ?payload.time_range))]
pub async fn overview(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<OverviewRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let store = owned_store(&state.db_pool, payload.store_id, merchant_id).await?;
  let today = Utc::now().date_naive();
  let (start, end) = payload.time_range.bounds(today);

  let total_sales = db::sales::total_amount(&state.db_pool, store.id, start, end).await?;
  let order_count = db::sales::completed_orders(&state.db_pool, store.id, start, end).await?;

  let since = today - Duration::days(POPULAR_WINDOW_DAYS - 1);
  let popular_products = db::sales::popular_products(&state.db_pool, store.id, since, POPULAR_LIMIT).await?;
  let product_ids: Vec<i64> = popular_products.iter().map(|p| p.product_id).collect();
  let volumes = if product_ids.is_empty() {
    Vec::new()
  } else {
    db::sales::price_volumes(&state.db_pool, store.id, &product_ids, since).await?
  };
  let pairs: Vec<(Decimal, i64)> = volumes.iter().map(|v| (v.unit_price, v.quantity)).collect();
  debug!(popular = popular_products.len(), "Overview computed.");

  Ok(ok(SalesOverview {
    total_sales,
    order_count,
    popular_products,
    average_price: weighted_average_price(&pairs),
  }))
}

#[derive(Debug, Deserialize)]
pub struct TrendRequest {
  pub store_id: i64,
  #[serde(rename = "type")]
  pub axis: TrendAxis,
  pub num_of_recent_days: u32,
}

#[derive(Debug, Serialize)]
pub struct SalesTrend {
  pub labels: Vec<String>,
  pub values: Vec<Decimal>,
}

impl From<Vec<TrendPoint>> for SalesTrend {
  fn from(points: Vec<TrendPoint>) -> Self {
    let (labels, values) = points.into_iter().map(|p| (p.label, p.value)).unzip();
    Self { labels, values }
  }
}

pub async fn trend(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<TrendRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let today = Utc::now().date_naive();
  let start = window_start(today, payload.num_of_recent_days)?;
  let store = owned_store(&state.db_pool, payload.store_id, merchant_id).await?;
  let totals: Vec<(NaiveDate, Decimal)> = db::sales::daily_totals(&state.db_pool, store.id, start, today)
    .await?
    .into_iter()
    .map(|row| (row.sale_date, row.amount))
    .collect();
  let points = bucket_trend(payload.axis, today, payload.num_of_recent_days, &totals)?;
  Ok(ok(SalesTrend::from(points)))
}

#[derive(Debug, Deserialize)]
pub struct ProductVolumeRequest {
  pub product_id: i64,
}

pub async fn product_volume(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<ProductVolumeRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let product = db::products::find_by_id(&state.db_pool, payload.product_id)
    .await?
    .ok_or_else(|| AppError::NotFound("商品不存在".to_string()))?;
  owned_store(&state.db_pool, product.store_id, merchant_id).await?;
  let volume = db::sales::product_volume(&state.db_pool, product.id).await?;
  Ok(ok(serde_json::json!({ "product_id": product.id, "volume": volume })))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn trend_points_split_into_parallel_arrays() {
    let trend = SalesTrend::from(vec![
      TrendPoint { label: "2024-03".to_string(), value: Decimal::from(12) },
      TrendPoint { label: "2024-04".to_string(), value: Decimal::ZERO },
    ]);
    assert_eq!(trend.labels, vec!["2024-03", "2024-04"]);
    assert_eq!(trend.values, vec![Decimal::from(12), Decimal::ZERO]);
  }

  #[test]
  fn overview_request_reads_screaming_case_ranges() {
    let req: OverviewRequest = serde_json::from_str(r#"{"store_id": 4, "time_range": "THIS_WEEK"}"#).unwrap();
    assert_eq!(req.time_range, TimeRange::ThisWeek);
    let trend: TrendRequest =
      serde_json::from_str(r#"{"store_id": 4, "type": "BY_MONTH", "num_of_recent_days": 90}"#).unwrap();
    assert_eq!(trend.axis, TrendAxis::ByMonth);
  }
}
