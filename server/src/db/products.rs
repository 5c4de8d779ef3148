// server/src/db/products.rs

use super::fetch_page;
use crate::models::Product;
use baoleme_core::domain::{ListingStatus, Page, PageRequest};
use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};

const PRODUCT_COLUMNS: &str = "id, store_id, name, description, price, category, stock, rating, status, image, created_at";

pub struct NewProduct<'a> {
  pub store_id: i64,
  pub name: &'a str,
  pub description: Option<&'a str>,
  pub price: Decimal,
  pub category: Option<&'a str>,
  pub stock: i32,
  pub image: Option<&'a str>,
}

#[derive(Debug, Default)]
pub struct ProductChanges {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price: Option<Decimal>,
  pub category: Option<String>,
  pub stock: Option<i32>,
  pub image: Option<String>,
}

pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, new_product: NewProduct<'_>) -> Result<Product, sqlx::Error> {
  sqlx::query_as::<_, Product>(&format!(
    "INSERT INTO products (store_id, name, description, price, category, stock, image) \
     VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
    PRODUCT_COLUMNS
  ))
  .bind(new_product.store_id)
  .bind(new_product.name)
  .bind(new_product.description)
  .bind(new_product.price)
  .bind(new_product.category)
  .bind(new_product.stock)
  .bind(new_product.image)
  .fetch_one(executor)
  .await
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<Product>, sqlx::Error> {
  sqlx::query_as::<_, Product>(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Several products at once, for pricing an order.
pub async fn find_many<'e, E: PgExecutor<'e>>(executor: E, ids: &[i64]) -> Result<Vec<Product>, sqlx::Error> {
  sqlx::query_as::<_, Product>(&format!("SELECT {} FROM products WHERE id = ANY($1)", PRODUCT_COLUMNS))
    .bind(ids)
    .fetch_all(executor)
    .await
}

pub async fn find_in_store_by_name<'e, E: PgExecutor<'e>>(
  executor: E,
  store_id: i64,
  name: &str,
) -> Result<Option<Product>, sqlx::Error> {
  sqlx::query_as::<_, Product>(&format!(
    "SELECT {} FROM products WHERE store_id = $1 AND name = $2 LIMIT 1",
    PRODUCT_COLUMNS
  ))
  .bind(store_id)
  .bind(name)
  .fetch_optional(executor)
  .await
}

pub async fn update<'e, E: PgExecutor<'e>>(executor: E, id: i64, changes: ProductChanges) -> Result<Option<Product>, sqlx::Error> {
  sqlx::query_as::<_, Product>(&format!(
    "UPDATE products SET \
       name = COALESCE($2, name), \
       description = COALESCE($3, description), \
       price = COALESCE($4, price), \
       category = COALESCE($5, category), \
       stock = COALESCE($6, stock), \
       image = COALESCE($7, image) \
     WHERE id = $1 RETURNING {}",
    PRODUCT_COLUMNS
  ))
  .bind(id)
  .bind(changes.name)
  .bind(changes.description)
  .bind(changes.price)
  .bind(changes.category)
  .bind(changes.stock)
  .bind(changes.image)
  .fetch_optional(executor)
  .await
}

pub async fn set_status<'e, E: PgExecutor<'e>>(executor: E, id: i64, status: ListingStatus) -> Result<bool, sqlx::Error> {
  let result = sqlx::query("UPDATE products SET status = $2 WHERE id = $1")
    .bind(id)
    .bind(status.code())
    .execute(executor)
    .await?;
  Ok(result.rows_affected() > 0)
}

/// Takes `quantity` off the stock only if enough is left.
pub async fn take_stock<'e, E: PgExecutor<'e>>(executor: E, id: i64, quantity: i32) -> Result<bool, sqlx::Error> {
  let result = sqlx::query("UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2")
    .bind(id)
    .bind(quantity)
    .execute(executor)
    .await?;
  Ok(result.rows_affected() == 1)
}

pub async fn delete<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<bool, sqlx::Error> {
  let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(executor).await?;
  Ok(result.rows_affected() > 0)
}

/// Products of one store. `on_sale_only` hides withdrawn products from customers.
pub async fn list_by_store(
  pool: &PgPool,
  store_id: i64,
  category: Option<String>,
  on_sale_only: bool,
  req: PageRequest,
) -> Result<Page<Product>, sqlx::Error> {
  let base = format!("SELECT {} FROM products WHERE TRUE", PRODUCT_COLUMNS);
  fetch_page(pool, &base, "id", req, |qb| {
    qb.push(" AND store_id = ").push_bind(store_id);
    if let Some(category) = &category {
      qb.push(" AND category = ").push_bind(category.clone());
    }
    if on_sale_only {
      qb.push(" AND status = ").push_bind(ListingStatus::Open.code());
    }
  })
  .await
}
