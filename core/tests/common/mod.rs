// tests/common/mod.rs
#![allow(dead_code)]

use baoleme_core::domain::{CouponKind, CouponPolicy, CouponTerms, PricedLine};
use baoleme_core::{ContextData, FlowError, Handler, StepControl};
use chrono::{DateTime, Duration, TimeZone, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use tracing::Level;

// --- Contexts ---

/// Mimics a checkout: lines are priced step by step and the trail records
/// which handlers ran.
#[derive(Clone, Debug, Default)]
pub struct TicketContext {
  pub trail: Vec<String>,
  pub total_cents: i64,
  pub stop_at: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct DispatchContext {
  pub rider_id: i64,
  pub assigned_order: Option<i64>,
}

// --- Error type ---

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("engine: {0}")]
  Flow(String),

  #[error("handler: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(err: FlowError) -> Self {
    TestError::Flow(err.to_string())
  }
}

// --- Handler creators ---

pub fn recording_handler(label: &'static str, add_cents: i64) -> Handler<TicketContext, TestError> {
  Box::new(move |ctx: ContextData<TicketContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.trail.push(label.to_string());
      guard.total_cents += add_cents;
      if guard.stop_at.as_deref() == Some(label) {
        return Ok(StepControl::Stop);
      }
      Ok(StepControl::Continue)
    })
  })
}

pub fn failing_handler(label: &'static str, message: &'static str) -> Handler<TicketContext, TestError> {
  Box::new(move |ctx: ContextData<TicketContext>| {
    Box::pin(async move {
      ctx.write().trail.push(label.to_string());
      Err(TestError::Handler(message.to_string()))
    })
  })
}

// --- Domain fixtures ---

pub fn dec(s: &str) -> Decimal {
  s.parse().expect("decimal literal")
}

pub fn fixed_now() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 5, 20, 12, 0, 0).single().expect("valid timestamp")
}

pub fn line(product_id: i64, price: &str, quantity: i32, stock: i32) -> PricedLine {
  PricedLine {
    product_id,
    name: format!("product-{}", product_id),
    unit_price: dec(price),
    quantity,
    stock,
  }
}

pub fn discount_coupon(rate: &str) -> CouponPolicy {
  CouponPolicy {
    terms: CouponTerms {
      kind: CouponKind::Discount,
      discount: Some(dec(rate)),
      full_amount: None,
      reduce_amount: None,
    },
    owner_id: Some(7),
    store_id: Some(3),
    expires_at: fixed_now() + Duration::days(1),
    used: false,
  }
}

pub fn reduction_coupon(full: &str, reduce: &str) -> CouponPolicy {
  CouponPolicy {
    terms: CouponTerms {
      kind: CouponKind::FullReduction,
      discount: None,
      full_amount: Some(dec(full)),
      reduce_amount: Some(dec(reduce)),
    },
    owner_id: None,
    store_id: None,
    expires_at: fixed_now() + Duration::days(1),
    used: false,
  }
}

// --- Tracing ---

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
