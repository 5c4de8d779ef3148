// server/src/db/merchants.rs

use super::{fetch_page, like_pattern};
use crate::models::{Credentials, Merchant};
use baoleme_core::domain::{Page, PageRequest};
use serde::Deserialize;
use sqlx::{PgExecutor, PgPool};

const MERCHANT_COLUMNS: &str = "id, username, password, phone, avatar, created_at";

#[derive(Debug, Default)]
pub struct MerchantChanges {
  pub username: Option<String>,
  pub password_hash: Option<String>,
  pub phone: Option<String>,
  pub avatar: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct MerchantFilter {
  pub keyword: Option<String>,
  pub start_id: Option<i64>,
  pub end_id: Option<i64>,
}

pub async fn username_taken<'e, E: PgExecutor<'e>>(
  executor: E,
  username: &str,
  except_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
  sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM merchants WHERE username = $1 AND id IS DISTINCT FROM $2)")
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
  sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM merchants WHERE phone = $1 AND id IS DISTINCT FROM $2)")
    .bind(phone)
    .bind(except_id)
    .fetch_one(executor)
    .await
}

pub async fn insert<'e, E: PgExecutor<'e>>(
  executor: E,
  username: &str,
  password_hash: &str,
  phone: &str,
  avatar: Option<&str>,
) -> Result<Merchant, sqlx::Error> {
  sqlx::query_as::<_, Merchant>(&format!(
    "INSERT INTO merchants (username, password, phone, avatar) VALUES ($1, $2, $3, $4) RETURNING {}",
    MERCHANT_COLUMNS
  ))
  .bind(username)
  .bind(password_hash)
  .bind(phone)
  .bind(avatar)
  .fetch_one(executor)
  .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<Merchant>, sqlx::Error> {
  sqlx::query_as::<_, Merchant>(&format!("SELECT {} FROM merchants WHERE id = $1", MERCHANT_COLUMNS))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn find_by_username<'e, E: PgExecutor<'e>>(executor: E, username: &str) -> Result<Option<Merchant>, sqlx::Error> {
  sqlx::query_as::<_, Merchant>(&format!("SELECT {} FROM merchants WHERE username = $1", MERCHANT_COLUMNS))
    .bind(username)
    .fetch_optional(executor)
    .await
}

pub async fn credentials_by_username<'e, E: PgExecutor<'e>>(
  executor: E,
  username: &str,
) -> Result<Option<Credentials>, sqlx::Error> {
  sqlx::query_as::<_, Credentials>("SELECT id, username, password FROM merchants WHERE username = $1")
    .bind(username)
    .fetch_optional(executor)
    .await
}

pub async fn update<'e, E: PgExecutor<'e>>(
  executor: E,
  id: i64,
  changes: MerchantChanges,
) -> Result<Option<Merchant>, sqlx::Error> {
  sqlx::query_as::<_, Merchant>(&format!(
    "UPDATE merchants SET \
       username = COALESCE($2, username), \
       password = COALESCE($3, password), \
       phone = COALESCE($4, phone), \
       avatar = COALESCE($5, avatar) \
     WHERE id = $1 RETURNING {}",
    MERCHANT_COLUMNS
  ))
  .bind(id)
  .bind(changes.username)
  .bind(changes.password_hash)
  .bind(changes.phone)
  .bind(changes.avatar)
  .fetch_optional(executor)
  .await
}

/// Stores, and through them products, coupons and orders, go with the row.
pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<bool, sqlx::Error> {
  let result = sqlx::query("DELETE FROM merchants WHERE id = $1").bind(id).execute(executor).await?;
  Ok(result.rows_affected() > 0)
}

pub async fn list(pool: &PgPool, filter: &MerchantFilter, req: PageRequest) -> Result<Page<Merchant>, sqlx::Error> {
  let base = format!("SELECT {} FROM merchants WHERE TRUE", MERCHANT_COLUMNS);
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
  })
  .await
}
