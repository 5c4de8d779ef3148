// server/src/models/admin.rs

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct Admin {
  pub id: i64,
  pub password: String,
  pub created_at: DateTime<Utc>,
}
