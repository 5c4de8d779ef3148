// server/src/db/admins.rs

use crate::models::Admin;
use sqlx::PgExecutor;

pub async fn find_by_id<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<Admin>, sqlx::Error> {
  sqlx::query_as::<_, Admin>("SELECT id, password, created_at FROM admins WHERE id = $1")
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn count<'e, E: PgExecutor<'e>>(executor: E) -> Result<i64, sqlx::Error> {
  sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admins").fetch_one(executor).await
}

pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, password_hash: &str) -> Result<Admin, sqlx::Error> {
  sqlx::query_as::<_, Admin>("INSERT INTO admins (password) VALUES ($1) RETURNING id, password, created_at")
    .bind(password_hash)
    .fetch_one(executor)
    .await
}
