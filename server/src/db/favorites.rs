// server/src/db/favorites.rs

//! Favorite stores and the browse history.

use super::fetch_page;
use super::stores::STORE_COLUMNS;
use crate::models::ViewedStore;
use baoleme_core::domain::{Page, PageRequest};
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

/// `false` when the store was already a favorite.
pub async fn add<'e, E: PgExecutor<'e>>(executor: E, user_id: i64, store_id: i64) -> Result<bool, sqlx::Error> {
  let result = sqlx::query("INSERT INTO favorites (user_id, store_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
    .bind(user_id)
    .bind(store_id)
    .execute(executor)
    .await?;
  Ok(result.rows_affected() == 1)
}

pub async fn remove<'e, E: PgExecutor<'e>>(executor: E, user_id: i64, store_id: i64) -> Result<bool, sqlx::Error> {
  let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND store_id = $2")
    .bind(user_id)
    .bind(store_id)
    .execute(executor)
    .await?;
  Ok(result.rows_affected() > 0)
}

/// Re-viewing a store only moves its timestamp.
pub async fn record_view<'e, E: PgExecutor<'e>>(
  executor: E,
  user_id: i64,
  store_id: i64,
  viewed_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
  sqlx::query(
    "INSERT INTO browse_history (user_id, store_id, created_at) VALUES ($1, $2, $3) \
     ON CONFLICT (user_id, store_id) DO UPDATE SET created_at = EXCLUDED.created_at",
  )
  .bind(user_id)
  .bind(store_id)
  .bind(viewed_at)
  .execute(executor)
  .await?;
  Ok(())
}

pub async fn view_history(pool: &PgPool, user_id: i64, req: PageRequest) -> Result<Page<ViewedStore>, sqlx::Error> {
  let base = format!(
    "SELECT {}, h.created_at AS viewed_at FROM browse_history h JOIN stores s ON s.id = h.store_id WHERE TRUE",
    STORE_COLUMNS
  );
  fetch_page(pool, &base, "viewed_at DESC", req, |qb| {
    qb.push(" AND h.user_id = ").push_bind(user_id);
  })
  .await
}
