// server/src/models/order.rs

use baoleme_core::domain::OrderStatus;
use baoleme_core::RuleViolation;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: i64,
  pub user_id: i64,
  pub store_id: i64,
  pub rider_id: Option<i64>,
  pub status: i16,
  pub user_location: String,
  pub store_location: Option<String>,
  pub total_price: Decimal,
  pub actual_price: Decimal,
  pub delivery_price: Decimal,
  pub remark: Option<String>,
  pub cancel_reason: Option<String>,
  pub created_at: DateTime<Utc>,
  pub deadline: Option<DateTime<Utc>>,
  pub ended_at: Option<DateTime<Utc>>,
}

impl Order {
  pub fn order_status(&self) -> Result<OrderStatus, RuleViolation> {
    OrderStatus::try_from(self.status)
  }
}

/// An order joined with the names a list view shows.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderSummary {
  #[sqlx(flatten)]
  #[serde(flatten)]
  pub order: Order,
  pub store_name: String,
  pub rider_name: Option<String>,
  pub merchant_phone: Option<String>,
}
