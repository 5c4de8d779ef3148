// server/src/models/cart_item.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartItem {
  pub user_id: i64,
  pub product_id: i64,
  pub quantity: i32,
  pub created_at: DateTime<Utc>,
}

/// A cart line joined with its product.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CartLine {
  pub product_id: i64,
  pub store_id: i64,
  pub product_name: String,
  pub price: Decimal,
  pub quantity: i32,
  pub subtotal: Decimal,
}
