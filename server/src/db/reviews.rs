// server/src/db/reviews.rs

use super::{fetch_page, fetch_page_clamped};
use crate::models::{Review, ReviewRow};
use baoleme_core::domain::{Page, PageRequest, ReviewFilter};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgExecutor, PgPool};

const REVIEW_ROW_BASE: &str = "SELECT r.id, r.user_id, r.store_id, r.product_id, r.rating, r.comment, r.image, r.created_at, \
   u.username, p.name AS product_name \
   FROM reviews r JOIN users u ON u.id = r.user_id LEFT JOIN products p ON p.id = r.product_id \
   WHERE TRUE";

pub struct NewReview<'a> {
  pub user_id: i64,
  pub store_id: i64,
  pub product_id: Option<i64>,
  pub rating: Decimal,
  pub comment: Option<&'a str>,
  pub image: Option<&'a str>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct AdminReviewFilter {
  pub user_id: Option<i64>,
  pub store_id: Option<i64>,
  pub product_id: Option<i64>,
  pub start_rating: Option<Decimal>,
  pub end_rating: Option<Decimal>,
  pub start_time: Option<DateTime<Utc>>,
  pub end_time: Option<DateTime<Utc>>,
}

pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, new_review: NewReview<'_>) -> Result<Review, sqlx::Error> {
  sqlx::query_as::<_, Review>(
    "INSERT INTO reviews (user_id, store_id, product_id, rating, comment, image) VALUES ($1, $2, $3, $4, $5, $6) \
     RETURNING id, user_id, store_id, product_id, rating, comment, image, created_at",
  )
  .bind(new_review.user_id)
  .bind(new_review.store_id)
  .bind(new_review.product_id)
  .bind(new_review.rating)
  .bind(new_review.comment)
  .bind(new_review.image)
  .fetch_one(executor)
  .await
}

/// Recomputes the store's rating from its reviews.
pub async fn refresh_store_rating<'e, E: PgExecutor<'e>>(executor: E, store_id: i64) -> Result<(), sqlx::Error> {
  sqlx::query(
    "UPDATE stores SET rating = COALESCE((SELECT ROUND(AVG(rating), 1) FROM reviews WHERE store_id = $1), 5.0) \
     WHERE id = $1",
  )
  .bind(store_id)
  .execute(executor)
  .await?;
  Ok(())
}

pub async fn find_row<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<ReviewRow>, sqlx::Error> {
  sqlx::query_as::<_, ReviewRow>(&format!("{} AND r.id = $1", REVIEW_ROW_BASE))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// A store's reviews, newest first. A page past the end shows the last page.
pub async fn list_for_store(
  pool: &PgPool,
  store_id: i64,
  filter: Option<ReviewFilter>,
  req: PageRequest,
) -> Result<Page<ReviewRow>, sqlx::Error> {
  fetch_page_clamped(pool, REVIEW_ROW_BASE, "r.created_at DESC, r.id DESC", req, |qb| {
    qb.push(" AND r.store_id = ").push_bind(store_id);
    let Some(filter) = filter else { return };
    if let Some((low, high)) = filter.rating_range() {
      qb.push(" AND r.rating BETWEEN ").push_bind(low).push(" AND ").push_bind(high);
    }
    if filter.requires_image() {
      qb.push(" AND r.image IS NOT NULL AND r.image <> ''");
    }
  })
  .await
}

pub async fn list(pool: &PgPool, filter: &AdminReviewFilter, req: PageRequest) -> Result<Page<ReviewRow>, sqlx::Error> {
  fetch_page(pool, REVIEW_ROW_BASE, "r.id", req, |qb| {
    if let Some(user_id) = filter.user_id {
      qb.push(" AND r.user_id = ").push_bind(user_id);
    }
    if let Some(store_id) = filter.store_id {
      qb.push(" AND r.store_id = ").push_bind(store_id);
    }
    if let Some(product_id) = filter.product_id {
      qb.push(" AND r.product_id = ").push_bind(product_id);
    }
    if let Some(start_rating) = filter.start_rating {
      qb.push(" AND r.rating >= ").push_bind(start_rating);
    }
    if let Some(end_rating) = filter.end_rating {
      qb.push(" AND r.rating <= ").push_bind(end_rating);
    }
    if let Some(start) = filter.start_time {
      qb.push(" AND r.created_at >= ").push_bind(start);
    }
    if let Some(end) = filter.end_time {
      qb.push(" AND r.created_at <= ").push_bind(end);
    }
  })
  .await
}
