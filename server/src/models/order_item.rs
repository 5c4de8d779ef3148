// server/src/models/order_item.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
  pub order_id: i64,
  pub product_id: i64,
  pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItemDetail {
  pub product_id: i64,
  pub product_name: String,
  pub price: Decimal,
  pub quantity: i32,
  pub image: Option<String>,
}
