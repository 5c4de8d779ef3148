// core/src/domain/coupon.rs

use crate::error::RuleViolation;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum CouponKind {
  /// Pay `discount` times the amount, e.g. 0.85.
  Discount,
  /// Take `reduce_amount` off once the amount reaches `full_amount`.
  FullReduction,
}

impl CouponKind {
  pub fn code(self) -> i16 {
    match self {
      CouponKind::Discount => 1,
      CouponKind::FullReduction => 2,
    }
  }
}

impl TryFrom<i16> for CouponKind {
  type Error = RuleViolation;

  fn try_from(code: i16) -> Result<Self, Self::Error> {
    match code {
      1 => Ok(CouponKind::Discount),
      2 => Ok(CouponKind::FullReduction),
      other => Err(RuleViolation::UnknownCouponKind(other)),
    }
  }
}

impl From<CouponKind> for i16 {
  fn from(kind: CouponKind) -> Self {
    kind.code()
  }
}

/// Money is kept to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
  amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// The pricing half of a coupon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponTerms {
  pub kind: CouponKind,
  pub discount: Option<Decimal>,
  pub full_amount: Option<Decimal>,
  pub reduce_amount: Option<Decimal>,
}

impl CouponTerms {
  /// Checked when a merchant creates the coupon.
  pub fn validate(&self) -> Result<(), RuleViolation> {
    match self.kind {
      CouponKind::Discount => match self.discount {
        Some(rate) if rate > Decimal::ZERO && rate < Decimal::ONE => Ok(()),
        _ => Err(RuleViolation::InvalidCouponTerms("折扣必须在0到1之间".to_string())),
      },
      CouponKind::FullReduction => match (self.full_amount, self.reduce_amount) {
        (Some(full), Some(reduce)) if reduce > Decimal::ZERO && full > reduce => Ok(()),
        _ => Err(RuleViolation::InvalidCouponTerms(
          "满减门槛必须大于减免金额且减免金额大于0".to_string(),
        )),
      },
    }
  }

  /// Price after the coupon, never negative.
  ///
  /// A full-reduction coupon below its threshold is refused rather than
  /// silently consumed.
  pub fn apply(&self, amount: Decimal) -> Result<Decimal, RuleViolation> {
    self.validate()?;
    let discounted = match self.kind {
      CouponKind::Discount => amount * self.discount.unwrap_or(Decimal::ONE),
      CouponKind::FullReduction => {
        let full = self.full_amount.unwrap_or(Decimal::ZERO);
        if amount < full {
          return Err(RuleViolation::CouponUnusable(format!("未达到满减门槛 {}", full)));
        }
        amount - self.reduce_amount.unwrap_or(Decimal::ZERO)
      }
    };
    Ok(round_money(discounted.max(Decimal::ZERO)))
  }
}

/// Everything needed to decide whether a coupon may be used or claimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouponPolicy {
  pub terms: CouponTerms,
  /// `None` while nobody has claimed it.
  pub owner_id: Option<i64>,
  /// `None` means the coupon works in every store.
  pub store_id: Option<i64>,
  pub expires_at: DateTime<Utc>,
  pub used: bool,
}

impl CouponPolicy {
  fn ensure_live(&self, now: DateTime<Utc>) -> Result<(), RuleViolation> {
    if self.used {
      return Err(RuleViolation::CouponUnusable("优惠券已使用".to_string()));
    }
    if self.expires_at <= now {
      return Err(RuleViolation::CouponUnusable("优惠券已过期".to_string()));
    }
    Ok(())
  }

  pub fn ensure_claimable(&self, user_id: i64, now: DateTime<Utc>) -> Result<(), RuleViolation> {
    self.ensure_live(now)?;
    match self.owner_id {
      None => Ok(()),
      Some(owner) if owner == user_id => Err(RuleViolation::CouponUnusable("优惠券已领取".to_string())),
      Some(_) => Err(RuleViolation::CouponUnusable("优惠券已被他人领取".to_string())),
    }
  }

  /// Checks ownership, store scope and liveness, then prices `amount`.
  pub fn redeem(&self, user_id: i64, store_id: i64, amount: Decimal, now: DateTime<Utc>) -> Result<Decimal, RuleViolation> {
    self.ensure_live(now)?;
    if self.owner_id.is_some_and(|owner| owner != user_id) {
      return Err(RuleViolation::CouponUnusable("优惠券不属于当前用户".to_string()));
    }
    if self.store_id.is_some_and(|scope| scope != store_id) {
      return Err(RuleViolation::CouponUnusable("优惠券不适用于该店铺".to_string()));
    }
    self.terms.apply(amount)
  }
}
