// server/src/db/users.rs

use super::{fetch_page, like_pattern};
use crate::models::{Credentials, User};
use baoleme_core::domain::{Page, PageRequest};
use serde::Deserialize;
use sqlx::{PgExecutor, PgPool};

const USER_COLUMNS: &str = "id, username, password, phone, description, location, gender, avatar, created_at";

pub struct NewUser<'a> {
  pub username: &'a str,
  pub password_hash: &'a str,
  pub phone: &'a str,
  pub gender: Option<&'a str>,
  pub description: Option<&'a str>,
  pub location: Option<&'a str>,
  pub avatar: Option<&'a str>,
}

/// Only `Some` fields are written.
#[derive(Debug, Default)]
pub struct UserChanges {
  pub username: Option<String>,
  pub password_hash: Option<String>,
  pub phone: Option<String>,
  pub gender: Option<String>,
  pub description: Option<String>,
  pub location: Option<String>,
  pub avatar: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct UserFilter {
  pub keyword: Option<String>,
  pub gender: Option<String>,
  pub start_id: Option<i64>,
  pub end_id: Option<i64>,
}

pub async fn username_taken<'e, E: PgExecutor<'e>>(
  executor: E,
  username: &str,
  except_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
  sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND id IS DISTINCT FROM $2)")
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
  sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE phone = $1 AND id IS DISTINCT FROM $2)")
    .bind(phone)
    .bind(except_id)
    .fetch_one(executor)
    .await
}

pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, new_user: NewUser<'_>) -> Result<User, sqlx::Error> {
  sqlx::query_as::<_, User>(&format!(
    "INSERT INTO users (username, password, phone, gender, description, location, avatar) \
     VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
    USER_COLUMNS
  ))
  .bind(new_user.username)
  .bind(new_user.password_hash)
  .bind(new_user.phone)
  .bind(new_user.gender)
  .bind(new_user.description)
  .bind(new_user.location)
  .bind(new_user.avatar)
  .fetch_one(executor)
  .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<User>, sqlx::Error> {
  sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn find_by_username<'e, E: PgExecutor<'e>>(executor: E, username: &str) -> Result<Option<User>, sqlx::Error> {
  sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS))
    .bind(username)
    .fetch_optional(executor)
    .await
}

pub async fn credentials_by_phone<'e, E: PgExecutor<'e>>(
  executor: E,
  phone: &str,
) -> Result<Option<Credentials>, sqlx::Error> {
  sqlx::query_as::<_, Credentials>("SELECT id, username, password FROM users WHERE phone = $1")
    .bind(phone)
    .fetch_optional(executor)
    .await
}

pub async fn update<'e, E: PgExecutor<'e>>(executor: E, id: i64, changes: UserChanges) -> Result<Option<User>, sqlx::Error> {
  sqlx::query_as::<_, User>(&format!(
    "UPDATE users SET \
       username = COALESCE($2, username), \
       password = COALESCE($3, password), \
       phone = COALESCE($4, phone), \
       gender = COALESCE($5, gender), \
       description = COALESCE($6, description), \
       location = COALESCE($7, location), \
       avatar = COALESCE($8, avatar) \
     WHERE id = $1 RETURNING {}",
    USER_COLUMNS
  ))
  .bind(id)
  .bind(changes.username)
  .bind(changes.password_hash)
  .bind(changes.phone)
  .bind(changes.gender)
  .bind(changes.description)
  .bind(changes.location)
  .bind(changes.avatar)
  .fetch_optional(executor)
  .await
}

/// Carts, favorites, browse history and reviews go with the row.
pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<bool, sqlx::Error> {
  let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(executor).await?;
  Ok(result.rows_affected() > 0)
}

pub async fn list(pool: &PgPool, filter: &UserFilter, req: PageRequest) -> Result<Page<User>, sqlx::Error> {
  let base = format!("SELECT {} FROM users WHERE TRUE", USER_COLUMNS);
  fetch_page(pool, &base, "id", req, |qb| {
    if let Some(keyword) = filter.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
      let pattern = like_pattern(keyword);
      qb.push(" AND (username ILIKE ")
        .push_bind(pattern.clone())
        .push(" OR phone ILIKE ")
        .push_bind(pattern)
        .push(")");
    }
    if let Some(gender) = &filter.gender {
      qb.push(" AND gender = ").push_bind(gender.clone());
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
