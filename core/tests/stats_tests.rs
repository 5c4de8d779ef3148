// tests/stats_tests.rs
mod common;

use baoleme_core::domain::stats::{bucket_trend, weighted_average_price, window_start};
use baoleme_core::domain::{TimeRange, TrendAxis};
use baoleme_core::RuleViolation;
use chrono::NaiveDate;
use common::dec;
use rust_decimal::Decimal;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn time_range_bounds() {
  // Thursday
  let today = day(2024, 5, 23);
  assert_eq!(TimeRange::Today.bounds(today), (today, today));
  assert_eq!(TimeRange::ThisWeek.bounds(today), (day(2024, 5, 20), today));
  assert_eq!(TimeRange::ThisMonth.bounds(today), (day(2024, 5, 1), today));
}

#[test]
fn daily_trend_fills_quiet_days_with_zero() {
  let totals = [
    (day(2024, 5, 20), dec("10.50")),
    (day(2024, 5, 20), dec("4.50")),
    (day(2024, 5, 22), dec("7")),
    (day(2024, 4, 1), dec("999")),
  ];
  let points = bucket_trend(TrendAxis::ByDay, day(2024, 5, 22), 3, &totals).expect("trend");

  let labels: Vec<_> = points.iter().map(|p| p.label.as_str()).collect();
  assert_eq!(labels, vec!["2024-05-20", "2024-05-21", "2024-05-22"]);
  assert_eq!(points[0].value, dec("15"));
  assert_eq!(points[1].value, Decimal::ZERO);
  assert_eq!(points[2].value, dec("7"));
}

#[test]
fn weekly_and_monthly_buckets_merge_days() {
  let totals = [(day(2024, 1, 1), dec("1")), (day(2024, 1, 8), dec("2")), (day(2024, 1, 14), dec("3"))];
  let weeks = bucket_trend(TrendAxis::ByWeek, day(2024, 1, 14), 14, &totals).expect("weeks");
  assert_eq!(weeks.len(), 2);
  assert_eq!(weeks[0].label, "2024-W01");
  assert_eq!(weeks[1].label, "2024-W02");
  assert_eq!(weeks[1].value, dec("5"));

  let months = bucket_trend(TrendAxis::ByMonth, day(2024, 2, 2), 33, &totals).expect("months");
  let labels: Vec<_> = months.iter().map(|p| p.label.clone()).collect();
  assert_eq!(labels, vec!["2024-01", "2024-02"]);
  assert_eq!(months[0].value, dec("6"));
}

#[test]
fn window_length_is_bounded() {
  assert_eq!(window_start(day(2024, 5, 22), 7), Ok(day(2024, 5, 16)));
  assert!(matches!(window_start(day(2024, 5, 22), 0), Err(RuleViolation::InvalidDayRange { .. })));
  assert!(window_start(day(2024, 5, 22), 367).is_err());
}

#[test]
fn average_price_is_weighted_by_quantity() {
  let sales = [(dec("10"), 3), (dec("20"), 1)];
  assert_eq!(weighted_average_price(&sales), dec("12.50"));
  assert_eq!(weighted_average_price(&[]), Decimal::ZERO);
}
