// tests/pricing_tests.rs
mod common;

use baoleme_core::domain::pricing::{ensure_quantities, quote};
use baoleme_core::domain::{CouponKind, CouponTerms, QuoteRequest};
use baoleme_core::RuleViolation;
use chrono::Duration;
use common::*;
use rust_decimal::Decimal;

fn basket() -> Vec<baoleme_core::domain::PricedLine> {
  // 2 x 12.50 + 3 x 3.30 = 34.90
  vec![line(1, "12.50", 2, 10), line(2, "3.30", 3, 5)]
}

#[test]
fn quote_without_coupon_adds_delivery() {
  let lines = basket();
  let q = quote(QuoteRequest {
    user_id: 7,
    store_id: 3,
    lines: &lines,
    coupon: None,
    delivery_price: dec("4"),
    now: fixed_now(),
  })
  .expect("quote");

  assert_eq!(q.total_price, dec("34.90"));
  assert_eq!(q.discounted_price, dec("34.90"));
  assert_eq!(q.actual_price, dec("38.90"));
}

#[test]
fn discount_rounds_half_away_from_zero() {
  let lines = basket();
  let coupon = discount_coupon("0.85");
  let q = quote(QuoteRequest {
    user_id: 7,
    store_id: 3,
    lines: &lines,
    coupon: Some(&coupon),
    delivery_price: dec("4"),
    now: fixed_now(),
  })
  .expect("quote");

  // 34.90 * 0.85 = 29.665
  assert_eq!(q.discounted_price, dec("29.67"));
  assert_eq!(q.actual_price, dec("33.67"));
}

#[test]
fn full_reduction_applies_at_threshold_only() {
  let coupon = reduction_coupon("30", "5");
  assert_eq!(coupon.redeem(1, 99, dec("34.90"), fixed_now()), Ok(dec("29.90")));
  assert_eq!(coupon.redeem(1, 99, dec("30"), fixed_now()), Ok(dec("25")));
  assert!(matches!(
    coupon.redeem(1, 99, dec("29.99"), fixed_now()),
    Err(RuleViolation::CouponUnusable(_))
  ));
}

#[test]
fn coupon_scope_is_enforced() {
  let coupon = discount_coupon("0.9");
  let now = fixed_now();

  assert!(coupon.redeem(7, 3, dec("10"), now).is_ok());
  assert!(coupon.redeem(8, 3, dec("10"), now).is_err(), "owned by someone else");
  assert!(coupon.redeem(7, 4, dec("10"), now).is_err(), "other store");

  let mut expired = coupon.clone();
  expired.expires_at = now - Duration::minutes(1);
  assert!(expired.redeem(7, 3, dec("10"), now).is_err());

  let mut used = coupon;
  used.used = true;
  assert!(used.redeem(7, 3, dec("10"), now).is_err());
}

#[test]
fn claiming_requires_an_unowned_live_coupon() {
  let now = fixed_now();
  let free = reduction_coupon("20", "3");
  assert!(free.ensure_claimable(5, now).is_ok());

  let owned = discount_coupon("0.8");
  assert!(owned.ensure_claimable(7, now).is_err());
  assert!(owned.ensure_claimable(8, now).is_err());

  let mut stale = free;
  stale.expires_at = now;
  assert!(stale.ensure_claimable(5, now).is_err());
}

#[test]
fn coupon_terms_are_validated() {
  let rate = |r: &str| CouponTerms {
    kind: CouponKind::Discount,
    discount: Some(dec(r)),
    full_amount: None,
    reduce_amount: None,
  };
  assert!(rate("0.5").validate().is_ok());
  assert!(rate("1").validate().is_err());
  assert!(rate("0").validate().is_err());

  let reduction = |full: &str, reduce: &str| CouponTerms {
    kind: CouponKind::FullReduction,
    discount: None,
    full_amount: Some(dec(full)),
    reduce_amount: Some(dec(reduce)),
  };
  assert!(reduction("50", "10").validate().is_ok());
  assert!(reduction("10", "10").validate().is_err());
  assert!(reduction("10", "0").validate().is_err());
  assert!(CouponKind::try_from(3).is_err());
}

#[test]
fn stock_and_quantities_are_checked() {
  let short = vec![line(1, "8", 4, 3)];
  let err = quote(QuoteRequest {
    user_id: 1,
    store_id: 1,
    lines: &short,
    coupon: None,
    delivery_price: Decimal::ZERO,
    now: fixed_now(),
  })
  .expect_err("not enough stock");
  assert_eq!(
    err,
    RuleViolation::InsufficientStock {
      product: "product-1".to_string()
    }
  );

  let err = quote(QuoteRequest {
    user_id: 1,
    store_id: 1,
    lines: &[],
    coupon: None,
    delivery_price: Decimal::ZERO,
    now: fixed_now(),
  })
  .expect_err("empty");
  assert_eq!(err, RuleViolation::EmptyOrder);

  assert_eq!(ensure_quantities(vec![1, 2]), Ok(()));
  assert_eq!(ensure_quantities(vec![1, 0]), Err(RuleViolation::NonPositiveQuantity));
  assert_eq!(ensure_quantities(Vec::new()), Err(RuleViolation::EmptyOrder));
}
