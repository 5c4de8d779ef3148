// server/src/db/riders.rs

use super::{fetch_page, like_pattern};
use crate::models::{Credentials, Rider, RiderEarnings};
use baoleme_core::domain::{DispatchMode, OrderStatus, Page, PageRequest, RiderState};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgExecutor, PgPool};

const RIDER_COLUMNS: &str = "id, username, password, phone, order_status, dispatch_mode, balance, avatar, created_at";

#[derive(Debug, Default)]
pub struct RiderChanges {
  pub username: Option<String>,
  pub password_hash: Option<String>,
  pub phone: Option<String>,
  pub avatar: Option<String>,
  pub dispatch_mode: Option<DispatchMode>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RiderFilter {
  pub keyword: Option<String>,
  pub start_id: Option<i64>,
  pub end_id: Option<i64>,
  pub status: Option<i16>,
  pub dispatch_mode: Option<i16>,
  pub start_balance: Option<i64>,
  pub end_balance: Option<i64>,
}

pub async fn username_taken<'e, E: PgExecutor<'e>>(
  executor: E,
  username: &str,
  except_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
  sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM riders WHERE username = $1 AND id IS DISTINCT FROM $2)")
    .bind(username)
    .bind(except_id)
    .fetch_one(executor)
    .await
}

pub async fn phone_taken<'e, E: PgExecutor<'e>>(
  executor: E,
  phone: &str,
  except_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
  sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM riders WHERE phone = $1 AND id IS DISTINCT FROM $2)")
    .bind(phone)
    .bind(except_id)
    .fetch_one(executor)
    .await
}

/// New riders start offline, in automatic mode, with an empty balance.
pub async fn insert<'e, E: PgExecutor<'e>>(
  executor: E,
  username: &str,
  password_hash: &str,
  phone: &str,
  avatar: Option<&str>,
) -> Result<Rider, sqlx::Error> {
  sqlx::query_as::<_, Rider>(&format!(
    "INSERT INTO riders (username, password, phone, avatar, order_status, dispatch_mode, balance) \
     VALUES ($1, $2, $3, $4, $5, $6, 0) RETURNING {}",
    RIDER_COLUMNS
  ))
  .bind(username)
  .bind(password_hash)
  .bind(phone)
  .bind(avatar)
  .bind(RiderState::Offline.code())
  .bind(DispatchMode::Automatic.code())
  .fetch_one(executor)
  .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<Rider>, sqlx::Error> {
  sqlx::query_as::<_, Rider>(&format!("SELECT {} FROM riders WHERE id = $1", RIDER_COLUMNS))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn find_by_username<'e, E: PgExecutor<'e>>(executor: E, username: &str) -> Result<Option<Rider>, sqlx::Error> {
  sqlx::query_as::<_, Rider>(&format!("SELECT {} FROM riders WHERE username = $1", RIDER_COLUMNS))
    .bind(username)
    .fetch_optional(executor)
    .await
}

pub async fn credentials_by_phone<'e, E: PgExecutor<'e>>(
  executor: E,
  phone: &str,
) -> Result<Option<Credentials>, sqlx::Error> {
  sqlx::query_as::<_, Credentials>("SELECT id, username, password FROM riders WHERE phone = $1")
    .bind(phone)
    .fetch_optional(executor)
    .await
}

pub async fn update<'e, E: PgExecutor<'e>>(executor: E, id: i64, changes: RiderChanges) -> Result<Option<Rider>, sqlx::Error> {
  sqlx::query_as::<_, Rider>(&format!(
    "UPDATE riders SET \
       username = COALESCE($2, username), \
       password = COALESCE($3, password), \
       phone = COALESCE($4, phone), \
       avatar = COALESCE($5, avatar), \
       dispatch_mode = COALESCE($6, dispatch_mode) \
     WHERE id = $1 RETURNING {}",
    RIDER_COLUMNS
  ))
  .bind(id)
  .bind(changes.username)
  .bind(changes.password_hash)
  .bind(changes.phone)
  .bind(changes.avatar)
  .bind(changes.dispatch_mode.map(DispatchMode::code))
  .fetch_optional(executor)
  .await
}

pub async fn set_state<'e, E: PgExecutor<'e>>(executor: E, id: i64, state: RiderState) -> Result<bool, sqlx::Error> {
  let result = sqlx::query("UPDATE riders SET order_status = $2 WHERE id = $1")
    .bind(id)
    .bind(state.code())
    .execute(executor)
    .await?;
  Ok(result.rows_affected() > 0)
}

/// Idle unless the rider still carries another accepted or delivering order.
pub async fn settle_state<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<(), sqlx::Error> {
  sqlx::query(
    "UPDATE riders SET order_status = CASE \
       WHEN EXISTS(SELECT 1 FROM orders WHERE rider_id = $1 AND status IN ($2, $3)) THEN $4 ELSE $5 END \
     WHERE id = $1 AND order_status <> $6",
  )
  .bind(id)
  .bind(OrderStatus::Accepted.code())
  .bind(OrderStatus::Delivering.code())
  .bind(RiderState::Busy.code())
  .bind(RiderState::Idle.code())
  .bind(RiderState::Offline.code())
  .execute(executor)
  .await?;
  Ok(())
}

pub async fn set_dispatch_mode<'e, E: PgExecutor<'e>>(executor: E, id: i64, mode: DispatchMode) -> Result<bool, sqlx::Error> {
  let result = sqlx::query("UPDATE riders SET dispatch_mode = $2 WHERE id = $1")
    .bind(id)
    .bind(mode.code())
    .execute(executor)
    .await?;
  Ok(result.rows_affected() > 0)
}

pub async fn credit_balance<'e, E: PgExecutor<'e>>(executor: E, id: i64, cents: i64) -> Result<(), sqlx::Error> {
  sqlx::query("UPDATE riders SET balance = balance + $2 WHERE id = $1")
    .bind(id)
    .bind(cents)
    .execute(executor)
    .await?;
  Ok(())
}

/// Locks the rider row so no order can be grabbed until the transaction ends.
pub async fn lock<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<bool, sqlx::Error> {
  let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM riders WHERE id = $1 FOR UPDATE")
    .bind(id)
    .fetch_optional(executor)
    .await?;
  Ok(row.is_some())
}

/// Orders the rider has accepted or is delivering.
pub async fn active_order_count<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<i64, sqlx::Error> {
  sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE rider_id = $1 AND status IN ($2, $3)")
    .bind(id)
    .bind(OrderStatus::Accepted.code())
    .bind(OrderStatus::Delivering.code())
    .fetch_one(executor)
    .await
}

pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<bool, sqlx::Error> {
  let result = sqlx::query("DELETE FROM riders WHERE id = $1").bind(id).execute(executor).await?;
  Ok(result.rows_affected() > 0)
}

/// Completed deliveries and the delivery fees they earned.
pub async fn earnings<'e, E: PgExecutor<'e>>(
  executor: E,
  id: i64,
  month_start: DateTime<Utc>,
) -> Result<RiderEarnings, sqlx::Error> {
  sqlx::query_as::<_, RiderEarnings>(
    "SELECT COUNT(*) AS completed_orders, \
       COALESCE(SUM(delivery_price), 0) AS total_earnings, \
       COALESCE(SUM(delivery_price) FILTER (WHERE ended_at >= $3), 0) AS current_month_earnings \
     FROM orders WHERE rider_id = $1 AND status = $2",
  )
  .bind(id)
  .bind(OrderStatus::Completed.code())
  .bind(month_start)
  .fetch_one(executor)
  .await
}

pub async fn list(pool: &PgPool, filter: &RiderFilter, req: PageRequest) -> Result<Page<Rider>, sqlx::Error> {
  let base = format!("SELECT {} FROM riders WHERE TRUE", RIDER_COLUMNS);
  fetch_page(pool, &base, "id", req, |qb| {
    if let Some(keyword) = filter.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
      let pattern = like_pattern(keyword);
      qb.push(" AND (username ILIKE ")
        .push_bind(pattern.clone())
        .push(" OR phone ILIKE ")
        .push_bind(pattern)
        .push(")");
    }
    if let Some(start_id) = filter.start_id {
      qb.push(" AND id >= ").push_bind(start_id);
    }
    if let Some(end_id) = filter.end_id {
      qb.push(" AND id <= ").push_bind(end_id);
    }
    if let Some(status) = filter.status {
      qb.push(" AND order_status = ").push_bind(status);
    }
    if let Some(mode) = filter.dispatch_mode {
      qb.push(" AND dispatch_mode = ").push_bind(mode);
    }
    if let Some(start_balance) = filter.start_balance {
      qb.push(" AND balance >= ").push_bind(start_balance);
    }
    if let Some(end_balance) = filter.end_balance {
      qb.push(" AND balance <= ").push_bind(end_balance);
    }
  })
  .await
}
