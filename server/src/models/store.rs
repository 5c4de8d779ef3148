// server/src/models/store.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Store {
  pub id: i64,
  pub merchant_id: i64,
  pub name: String,
  pub description: Option<String>,
  pub location: Option<String>,
  #[sqlx(rename = "type")]
  #[serde(rename = "type")]
  pub store_type: Option<String>,
  pub rating: Decimal,
  pub status: i16,
  pub image: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// A store as it appears in browse history.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ViewedStore {
  #[sqlx(flatten)]
  #[serde(flatten)]
  pub store: Store,
  pub viewed_at: DateTime<Utc>,
}
