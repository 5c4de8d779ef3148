// server/src/models/coupon.rs

use baoleme_core::domain::{CouponKind, CouponPolicy, CouponTerms};
use baoleme_core::RuleViolation;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Coupon {
  pub id: i64,
  pub user_id: Option<i64>,
  pub store_id: Option<i64>,
  #[sqlx(rename = "type")]
  #[serde(rename = "type")]
  pub kind: i16,
  pub discount: Option<Decimal>,
  pub full_amount: Option<Decimal>,
  pub reduce_amount: Option<Decimal>,
  pub expiration_date: DateTime<Utc>,
  pub is_used: bool,
  pub created_at: DateTime<Utc>,
}

impl Coupon {
  pub fn policy(&self) -> Result<CouponPolicy, RuleViolation> {
    Ok(CouponPolicy {
      terms: CouponTerms {
        kind: CouponKind::try_from(self.kind)?,
        discount: self.discount,
        full_amount: self.full_amount,
        reduce_amount: self.reduce_amount,
      },
      owner_id: self.user_id,
      store_id: self.store_id,
      expires_at: self.expiration_date,
      used: self.is_used,
    })
  }
}
