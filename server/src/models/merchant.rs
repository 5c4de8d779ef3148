// server/src/models/merchant.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Merchant {
  pub id: i64,
  pub username: String,
  #[serde(skip_serializing)]
  pub password: String,
  pub phone: String,
  pub avatar: Option<String>,
  pub created_at: DateTime<Utc>,
}
