// core/src/domain/pricing.rs

//! Order totals.

use super::coupon::{round_money, CouponPolicy};
use crate::error::RuleViolation;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// One requested line, already matched against the product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedLine {
  pub product_id: i64,
  pub name: String,
  pub unit_price: Decimal,
  pub quantity: i32,
  pub stock: i32,
}

impl PricedLine {
  pub fn subtotal(&self) -> Decimal {
    self.unit_price * Decimal::from(self.quantity)
  }

  pub fn ensure_in_stock(&self) -> Result<(), RuleViolation> {
    if self.quantity <= 0 {
      return Err(RuleViolation::NonPositiveQuantity);
    }
    if self.stock < self.quantity {
      return Err(RuleViolation::InsufficientStock {
        product: self.name.clone(),
      });
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderQuote {
  /// Sum of line subtotals.
  pub total_price: Decimal,
  /// After the coupon, before delivery.
  pub discounted_price: Decimal,
  pub delivery_price: Decimal,
  /// What the customer pays.
  pub actual_price: Decimal,
}

/// Requested quantities must be positive and the list non-empty.
pub fn ensure_quantities<I>(quantities: I) -> Result<(), RuleViolation>
where
  I: IntoIterator<Item = i32>,
{
  let mut any = false;
  for quantity in quantities {
    any = true;
    if quantity <= 0 {
      return Err(RuleViolation::NonPositiveQuantity);
    }
  }
  if any {
    Ok(())
  } else {
    Err(RuleViolation::EmptyOrder)
  }
}

pub struct QuoteRequest<'a> {
  pub user_id: i64,
  pub store_id: i64,
  pub lines: &'a [PricedLine],
  pub coupon: Option<&'a CouponPolicy>,
  pub delivery_price: Decimal,
  pub now: DateTime<Utc>,
}

pub fn quote(req: QuoteRequest<'_>) -> Result<OrderQuote, RuleViolation> {
  if req.lines.is_empty() {
    return Err(RuleViolation::EmptyOrder);
  }
  for line in req.lines {
    line.ensure_in_stock()?;
  }
  let total_price = round_money(req.lines.iter().map(PricedLine::subtotal).sum());
  let discounted_price = match req.coupon {
    Some(coupon) => coupon.redeem(req.user_id, req.store_id, total_price, req.now)?,
    None => total_price,
  };
  let delivery_price = round_money(req.delivery_price.max(Decimal::ZERO));
  Ok(OrderQuote {
    total_price,
    discounted_price,
    delivery_price,
    actual_price: discounted_price + delivery_price,
  })
}
