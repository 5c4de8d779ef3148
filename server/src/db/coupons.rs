// server/src/db/coupons.rs

use crate::models::Coupon;
use baoleme_core::domain::CouponTerms;
use chrono::{DateTime, Utc};
use sqlx::PgExecutor;

const COUPON_COLUMNS: &str =
  "id, user_id, store_id, type, discount, full_amount, reduce_amount, expiration_date, is_used, created_at";

pub async fn insert<'e, E: PgExecutor<'e>>(
  executor: E,
  store_id: i64,
  terms: &CouponTerms,
  expiration_date: DateTime<Utc>,
) -> Result<Coupon, sqlx::Error> {
  sqlx::query_as::<_, Coupon>(&format!(
    "INSERT INTO coupons (store_id, type, discount, full_amount, reduce_amount, expiration_date) \
     VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
    COUPON_COLUMNS
  ))
  .bind(store_id)
  .bind(terms.kind.code())
  .bind(terms.discount)
  .bind(terms.full_amount)
  .bind(terms.reduce_amount)
  .bind(expiration_date)
  .fetch_one(executor)
  .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<Coupon>, sqlx::Error> {
  sqlx::query_as::<_, Coupon>(&format!("SELECT {} FROM coupons WHERE id = $1", COUPON_COLUMNS))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Locks the row until the surrounding transaction ends.
pub async fn find_for_update<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<Coupon>, sqlx::Error> {
  sqlx::query_as::<_, Coupon>(&format!("SELECT {} FROM coupons WHERE id = $1 FOR UPDATE", COUPON_COLUMNS))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// The user's usable coupons, optionally only those valid in `store_id`.
pub async fn list_usable<'e, E: PgExecutor<'e>>(
  executor: E,
  user_id: i64,
  store_id: Option<i64>,
  now: DateTime<Utc>,
) -> Result<Vec<Coupon>, sqlx::Error> {
  sqlx::query_as::<_, Coupon>(&format!(
    "SELECT {} FROM coupons \
     WHERE user_id = $1 AND NOT is_used AND expiration_date > $2 \
       AND ($3::BIGINT IS NULL OR store_id IS NULL OR store_id = $3) \
     ORDER BY expiration_date",
    COUPON_COLUMNS
  ))
  .bind(user_id)
  .bind(now)
  .bind(store_id)
  .fetch_all(executor)
  .await
}

pub async fn list_unclaimed<'e, E: PgExecutor<'e>>(executor: E, store_id: i64, now: DateTime<Utc>) -> Result<Vec<Coupon>, sqlx::Error> {
  sqlx::query_as::<_, Coupon>(&format!(
    "SELECT {} FROM coupons \
     WHERE store_id = $1 AND user_id IS NULL AND NOT is_used AND expiration_date > $2 \
     ORDER BY id",
    COUPON_COLUMNS
  ))
  .bind(store_id)
  .bind(now)
  .fetch_all(executor)
  .await
}

/// Assigns an unclaimed coupon. `false` if someone got there first.
pub async fn claim<'e, E: PgExecutor<'e>>(executor: E, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
  let result = sqlx::query("UPDATE coupons SET user_id = $2 WHERE id = $1 AND user_id IS NULL AND NOT is_used")
    .bind(id)
    .bind(user_id)
    .execute(executor)
    .await?;
  Ok(result.rows_affected() == 1)
}

pub async fn redeem<'e, E: PgExecutor<'e>>(executor: E, id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
  let result = sqlx::query(
    "UPDATE coupons SET is_used = TRUE, user_id = $2 \
     WHERE id = $1 AND NOT is_used AND (user_id IS NULL OR user_id = $2)",
  )
  .bind(id)
  .bind(user_id)
  .execute(executor)
  .await?;
  Ok(result.rows_affected() == 1)
}
