// server/src/db/stores.rs

use super::{fetch_page, like_pattern};
use crate::models::Store;
use baoleme_core::domain::{ListingStatus, Page, PageRequest};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgExecutor, PgPool};

pub(crate) const STORE_COLUMNS: &str =
  "s.id, s.merchant_id, s.name, s.description, s.location, s.type, s.rating, s.status, s.image, s.created_at";

pub struct NewStore<'a> {
  pub merchant_id: i64,
  pub name: &'a str,
  pub description: Option<&'a str>,
  pub location: Option<&'a str>,
  pub store_type: Option<&'a str>,
  pub image: Option<&'a str>,
}

#[derive(Debug, Default)]
pub struct StoreChanges {
  pub name: Option<String>,
  pub description: Option<String>,
  pub location: Option<String>,
  pub store_type: Option<String>,
  pub image: Option<String>,
}

/// Narrowing used by the customer search, favorites and the admin list.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StoreFilter {
  pub keyword: Option<String>,
  #[serde(rename = "type")]
  pub store_type: Option<String>,
  pub status: Option<i16>,
  pub start_rating: Option<Decimal>,
  pub end_rating: Option<Decimal>,
  /// Keep stores selling at least one product at or below this price.
  pub wish_price: Option<Decimal>,
}

impl StoreFilter {
  fn push(&self, qb: &mut sqlx::QueryBuilder<'_, sqlx::Postgres>, match_products: bool) {
    if let Some(keyword) = self.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
      let pattern = like_pattern(keyword);
      qb.push(" AND (s.name ILIKE ")
        .push_bind(pattern.clone())
        .push(" OR s.type ILIKE ")
        .push_bind(pattern.clone());
      if match_products {
        qb.push(" OR EXISTS(SELECT 1 FROM products p WHERE p.store_id = s.id AND p.status = ")
          .push_bind(ListingStatus::Open.code())
          .push(" AND p.name ILIKE ")
          .push_bind(pattern)
          .push(")");
      }
      qb.push(")");
    }
    if let Some(store_type) = &self.store_type {
      qb.push(" AND s.type = ").push_bind(store_type.clone());
    }
    if let Some(status) = self.status {
      qb.push(" AND s.status = ").push_bind(status);
    }
    if let Some(start_rating) = self.start_rating {
      qb.push(" AND s.rating >= ").push_bind(start_rating);
    }
    if let Some(end_rating) = self.end_rating {
      qb.push(" AND s.rating <= ").push_bind(end_rating);
    }
    if let Some(wish_price) = self.wish_price {
      qb.push(" AND EXISTS(SELECT 1 FROM products wp WHERE wp.store_id = s.id AND wp.status = ")
        .push_bind(ListingStatus::Open.code())
        .push(" AND wp.price <= ")
        .push_bind(wish_price)
        .push(")");
    }
  }
}

pub async fn name_taken<'e, E: PgExecutor<'e>>(executor: E, name: &str, except_id: Option<i64>) -> Result<bool, sqlx::Error> {
  sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM stores WHERE name = $1 AND id IS DISTINCT FROM $2)")
    .bind(name)
    .bind(except_id)
    .fetch_one(executor)
    .await
}

pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, new_store: NewStore<'_>) -> Result<Store, sqlx::Error> {
  sqlx::query_as::<_, Store>(&format!(
    "INSERT INTO stores AS s (merchant_id, name, description, location, type, image) \
     VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
    STORE_COLUMNS
  ))
  .bind(new_store.merchant_id)
  .bind(new_store.name)
  .bind(new_store.description)
  .bind(new_store.location)
  .bind(new_store.store_type)
  .bind(new_store.image)
  .fetch_one(executor)
  .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<Store>, sqlx::Error> {
  sqlx::query_as::<_, Store>(&format!("SELECT {} FROM stores s WHERE s.id = $1", STORE_COLUMNS))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn find_by_name<'e, E: PgExecutor<'e>>(executor: E, name: &str) -> Result<Option<Store>, sqlx::Error> {
  sqlx::query_as::<_, Store>(&format!("SELECT {} FROM stores s WHERE s.name = $1", STORE_COLUMNS))
    .bind(name)
    .fetch_optional(executor)
    .await
}

pub async fn update<'e, E: PgExecutor<'e>>(executor: E, id: i64, changes: StoreChanges) -> Result<Option<Store>, sqlx::Error> {
  sqlx::query_as::<_, Store>(&format!(
    "UPDATE stores AS s SET \
       name = COALESCE($2, s.name), \
       description = COALESCE($3, s.description), \
       location = COALESCE($4, s.location), \
       type = COALESCE($5, s.type), \
       image = COALESCE($6, s.image) \
     WHERE s.id = $1 RETURNING {}",
    STORE_COLUMNS
  ))
  .bind(id)
  .bind(changes.name)
  .bind(changes.description)
  .bind(changes.location)
  .bind(changes.store_type)
  .bind(changes.image)
  .fetch_optional(executor)
  .await
}

pub async fn set_status<'e, E: PgExecutor<'e>>(executor: E, id: i64, status: ListingStatus) -> Result<bool, sqlx::Error> {
  let result = sqlx::query("UPDATE stores SET status = $2 WHERE id = $1")
    .bind(id)
    .bind(status.code())
    .execute(executor)
    .await?;
  Ok(result.rows_affected() > 0)
}

pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<bool, sqlx::Error> {
  let result = sqlx::query("DELETE FROM stores WHERE id = $1").bind(id).execute(executor).await?;
  Ok(result.rows_affected() > 0)
}

pub async fn list_by_merchant(pool: &PgPool, merchant_id: i64, req: PageRequest) -> Result<Page<Store>, sqlx::Error> {
  let base = format!("SELECT {} FROM stores s WHERE TRUE", STORE_COLUMNS);
  fetch_page(pool, &base, "s.id DESC", req, |qb| {
    qb.push(" AND s.merchant_id = ").push_bind(merchant_id);
  })
  .await
}

/// Open stores for customers, optionally of one type.
pub async fn list_open(pool: &PgPool, store_type: Option<String>, req: PageRequest) -> Result<Page<Store>, sqlx::Error> {
  let filter = StoreFilter {
    store_type,
    status: Some(ListingStatus::Open.code()),
    ..Default::default()
  };
  let base = format!("SELECT {} FROM stores s WHERE TRUE", STORE_COLUMNS);
  fetch_page(pool, &base, "s.rating DESC, s.id", req, |qb| filter.push(qb, false)).await
}

/// Customer keyword search: store name, type or any on-sale product name.
pub async fn search_open(pool: &PgPool, filter: &StoreFilter, req: PageRequest) -> Result<Page<Store>, sqlx::Error> {
  let filter = StoreFilter {
    status: Some(ListingStatus::Open.code()),
    ..filter.clone()
  };
  let base = format!("SELECT {} FROM stores s WHERE TRUE", STORE_COLUMNS);
  fetch_page(pool, &base, "s.rating DESC, s.id", req, |qb| filter.push(qb, true)).await
}

pub async fn list_favorites(
  pool: &PgPool,
  user_id: i64,
  filter: &StoreFilter,
  req: PageRequest,
) -> Result<Page<Store>, sqlx::Error> {
  let base = format!(
    "SELECT {}, f.created_at AS favorited_at FROM stores s JOIN favorites f ON f.store_id = s.id WHERE TRUE",
    STORE_COLUMNS
  );
  fetch_page(pool, &base, "favorited_at DESC", req, |qb| {
    qb.push(" AND f.user_id = ").push_bind(user_id);
    filter.push(qb, false);
  })
  .await
}

pub async fn list_all(pool: &PgPool, filter: &StoreFilter, req: PageRequest) -> Result<Page<Store>, sqlx::Error> {
  let base = format!("SELECT {} FROM stores s WHERE TRUE", STORE_COLUMNS);
  fetch_page(pool, &base, "s.id", req, |qb| filter.push(qb, false)).await
}

#[derive(Debug, Clone, FromRow)]
pub struct CatalogHit {
  pub store_id: i64,
  pub store_name: String,
  pub product_id: Option<i64>,
  pub product_name: Option<String>,
}

/// Stores whose name matches, plus stores owning a matching product, with those products.
pub async fn search_catalog<'e, E: PgExecutor<'e>>(executor: E, keyword: &str) -> Result<Vec<CatalogHit>, sqlx::Error> {
  sqlx::query_as::<_, CatalogHit>(
    "SELECT s.id AS store_id, s.name AS store_name, p.id AS product_id, p.name AS product_name \
     FROM stores s LEFT JOIN products p ON p.store_id = s.id AND p.name ILIKE $1 \
     WHERE s.name ILIKE $1 OR p.id IS NOT NULL \
     ORDER BY s.id, p.id",
  )
  .bind(like_pattern(keyword))
  .fetch_all(executor)
  .await
}
