// server/src/models/message.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Message {
  pub id: i64,
  pub sender_id: i64,
  pub sender_role: String,
  pub receiver_id: i64,
  pub receiver_role: String,
  pub content: String,
  pub created_at: DateTime<Utc>,
}
