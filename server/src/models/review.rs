// server/src/models/review.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
  pub id: i64,
  pub user_id: i64,
  pub store_id: i64,
  pub product_id: Option<i64>,
  pub rating: Decimal,
  pub comment: Option<String>,
  pub image: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// What merchants and admins see: the reviewer's name and split image paths.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
  pub id: i64,
  pub user_id: i64,
  pub username: String,
  pub store_id: i64,
  pub product_id: Option<i64>,
  pub product_name: Option<String>,
  pub rating: Decimal,
  pub comment: Option<String>,
  pub images: Vec<String>,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReviewRow {
  #[sqlx(flatten)]
  pub review: Review,
  pub username: String,
  pub product_name: Option<String>,
}

impl From<ReviewRow> for ReviewView {
  fn from(row: ReviewRow) -> Self {
    let images = baoleme_core::domain::review::split_images(row.review.image.as_deref());
    Self {
      id: row.review.id,
      user_id: row.review.user_id,
      username: row.username,
      store_id: row.review.store_id,
      product_id: row.review.product_id,
      product_name: row.product_name,
      rating: row.review.rating,
      comment: row.review.comment,
      images,
      created_at: row.review.created_at,
    }
  }
}
