// core/src/domain/stats.rs

//! Sales statistics that do not need the database: date windows, trend
//! bucketing and price averaging.

use super::coupon::round_money;
use crate::error::RuleViolation;
use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const MAX_TREND_DAYS: u32 = 366;

/// Window used by the sales overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeRange {
  Today,
  ThisWeek,
  ThisMonth,
}

impl TimeRange {
  /// Inclusive `(start, end)`; weeks start on Monday.
  pub fn bounds(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = match self {
      TimeRange::Today => today,
      TimeRange::ThisWeek => today - Duration::days(i64::from(today.weekday().num_days_from_monday())),
      TimeRange::ThisMonth => today.with_day(1).unwrap_or(today),
    };
    (start, today)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendAxis {
  ByDay,
  ByWeek,
  ByMonth,
}

impl TrendAxis {
  /// Labels sort in calendar order: `2024-03-05`, `2024-W10`, `2024-03`.
  pub fn label(self, date: NaiveDate) -> String {
    match self {
      TrendAxis::ByDay => date.format("%Y-%m-%d").to_string(),
      TrendAxis::ByWeek => {
        let week = date.iso_week();
        format!("{}-W{:02}", week.year(), week.week())
      }
      TrendAxis::ByMonth => date.format("%Y-%m").to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
  pub label: String,
  pub value: Decimal,
}

/// First day of a `days`-long window that ends on `end`.
pub fn window_start(end: NaiveDate, days: u32) -> Result<NaiveDate, RuleViolation> {
  if days == 0 || days > MAX_TREND_DAYS {
    return Err(RuleViolation::InvalidDayRange { max: MAX_TREND_DAYS });
  }
  Ok(end - Duration::days(i64::from(days) - 1))
}

/// Groups per-day totals into buckets along `axis`.
///
/// Every day of the window lands in a bucket, so quiet periods show up as
/// zero instead of disappearing. Totals outside the window are ignored.
pub fn bucket_trend(
  axis: TrendAxis,
  end: NaiveDate,
  days: u32,
  daily_totals: &[(NaiveDate, Decimal)],
) -> Result<Vec<TrendPoint>, RuleViolation> {
  let start = window_start(end, days)?;
  let mut points: Vec<TrendPoint> = Vec::new();
  let mut day = start;
  while day <= end {
    let label = axis.label(day);
    let value: Decimal = daily_totals
      .iter()
      .filter(|(date, _)| *date == day)
      .map(|(_, amount)| *amount)
      .sum();
    match points.last_mut() {
      Some(last) if last.label == label => last.value += value,
      _ => points.push(TrendPoint { label, value }),
    }
    day += Duration::days(1);
  }
  Ok(points)
}

/// Quantity-weighted mean of `(unit_price, quantity)` pairs, in cents.
pub fn weighted_average_price(sales: &[(Decimal, i64)]) -> Decimal {
  let total_quantity: i64 = sales.iter().map(|(_, qty)| (*qty).max(0)).sum();
  if total_quantity == 0 {
    return Decimal::ZERO;
  }
  let total_value: Decimal = sales
    .iter()
    .map(|(price, qty)| *price * Decimal::from((*qty).max(0)))
    .sum();
  round_money(total_value / Decimal::from(total_quantity))
}
