// server/src/models/rider.rs

use baoleme_core::domain::{DispatchMode, RiderState};
use baoleme_core::RuleViolation;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Rider {
  pub id: i64,
  pub username: String,
  #[serde(skip_serializing)]
  pub password: String,
  pub phone: String,
  pub order_status: i16,
  pub dispatch_mode: i16,
  /// Cents.
  pub balance: i64,
  pub avatar: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl Rider {
  pub fn state(&self) -> Result<RiderState, RuleViolation> {
    RiderState::try_from(self.order_status)
  }

  pub fn mode(&self) -> Result<DispatchMode, RuleViolation> {
    DispatchMode::try_from(self.dispatch_mode)
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RiderEarnings {
  pub completed_orders: i64,
  pub total_earnings: Decimal,
  pub current_month_earnings: Decimal,
}
