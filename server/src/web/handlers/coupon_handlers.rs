// server/src/web/handlers/coupon_handlers.rs

use actix_web::{web, HttpResponse};
use baoleme_core::domain::{CouponKind, CouponTerms, Role};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::db;
use crate::errors::AppError;
use crate::pipelines::common_steps::owned_store;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedPrincipal;
use crate::web::response::ok;

#[derive(Debug, Deserialize)]
pub struct CreateCouponRequest {
  pub store_id: i64,
  #[serde(rename = "type")]
  pub kind: i16,
  pub discount: Option<Decimal>,
  pub full_amount: Option<Decimal>,
  pub reduce_amount: Option<Decimal>,
  pub expiration_date: DateTime<Utc>,
}

impl CreateCouponRequest {
  fn terms(&self) -> Result<CouponTerms, AppError> {
    let terms = CouponTerms {
      kind: CouponKind::try_from(self.kind)?,
      discount: self.discount,
      full_amount: self.full_amount,
      reduce_amount: self.reduce_amount,
    };
    terms.validate()?;
    Ok(terms)
  }
}

/// Creates an unclaimed coupon for an owned store.
#[instrument(name = "handler::create_coupon", skip_all, fields(merchant_id = auth.id(), store_id = payload.store_id))]
pub async fn create(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<CreateCouponRequest>,
) -> Result<HttpResponse, AppError> {
  let merchant_id = auth.require(Role::Merchant)?;
  let terms = payload.terms()?;
  if payload.expiration_date <= Utc::now() {
    return Err(AppError::Validation("过期时间必须晚于当前时间".to_string()));
  }
  let store = owned_store(&state.db_pool, payload.store_id, merchant_id).await?;
  let coupon = db::coupons::insert(&state.db_pool, store.id, &terms, payload.expiration_date).await?;
  info!(coupon_id = coupon.id, kind = coupon.kind, "Coupon created.");
  Ok(ok(coupon))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request(kind: i16, discount: Option<Decimal>, full: Option<Decimal>, reduce: Option<Decimal>) -> CreateCouponRequest {
    CreateCouponRequest {
      store_id: 1,
      kind,
      discount,
      full_amount: full,
      reduce_amount: reduce,
      expiration_date: Utc::now(),
    }
  }

  #[test]
  fn discount_coupon_needs_rate_below_one() {
    assert!(request(1, Some(Decimal::new(8, 1)), None, None).terms().is_ok());
    assert!(matches!(request(1, Some(Decimal::ONE), None, None).terms(), Err(AppError::Rule(_))));
    assert!(matches!(request(1, None, None, None).terms(), Err(AppError::Rule(_))));
  }

  #[test]
  fn full_reduction_needs_threshold_above_reduction() {
    let ok = request(2, None, Some(Decimal::from(50)), Some(Decimal::from(10)));
    assert_eq!(ok.terms().map(|t| t.kind).ok(), Some(CouponKind::FullReduction));
    assert!(request(2, None, Some(Decimal::from(10)), Some(Decimal::from(10))).terms().is_err());
  }

  #[test]
  fn unknown_kind_is_rejected() {
    assert!(request(7, Some(Decimal::new(5, 1)), None, None).terms().is_err());
  }
}
