// server/src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: i64,
  pub store_id: i64,
  pub name: String,
  pub description: Option<String>,
  pub price: Decimal,
  pub category: Option<String>,
  pub stock: i32,
  pub rating: Decimal,
  pub status: i16,
  pub image: Option<String>,
  pub created_at: DateTime<Utc>,
}
