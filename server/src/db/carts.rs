// server/src/db/carts.rs

use crate::models::{CartItem, CartLine};
use sqlx::PgExecutor;

/// Adds to an existing line or starts a new one.
pub async fn add<'e, E: PgExecutor<'e>>(executor: E, user_id: i64, product_id: i64, quantity: i32) -> Result<CartItem, sqlx::Error> {
  sqlx::query_as::<_, CartItem>(
    "INSERT INTO cart_items (user_id, product_id, quantity) VALUES ($1, $2, $3) \
     ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity \
     RETURNING user_id, product_id, quantity, created_at",
  )
  .bind(user_id)
  .bind(product_id)
  .bind(quantity)
  .fetch_one(executor)
  .await
}

pub async fn lines<'e, E: PgExecutor<'e>>(executor: E, user_id: i64) -> Result<Vec<CartLine>, sqlx::Error> {
  sqlx::query_as::<_, CartLine>(
    "SELECT c.product_id, p.store_id, p.name AS product_name, p.price, c.quantity, \
       p.price * c.quantity AS subtotal \
     FROM cart_items c JOIN products p ON p.id = c.product_id \
     WHERE c.user_id = $1 ORDER BY c.created_at",
  )
  .bind(user_id)
  .fetch_all(executor)
  .await
}

pub async fn set_quantity<'e, E: PgExecutor<'e>>(executor: E, user_id: i64, product_id: i64, quantity: i32) -> Result<bool, sqlx::Error> {
  let result = sqlx::query("UPDATE cart_items SET quantity = $3 WHERE user_id = $1 AND product_id = $2")
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .execute(executor)
    .await?;
  Ok(result.rows_affected() > 0)
}

pub async fn remove_line<'e, E: PgExecutor<'e>>(executor: E, user_id: i64, product_id: i64) -> Result<bool, sqlx::Error> {
  let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
    .bind(user_id)
    .bind(product_id)
    .execute(executor)
    .await?;
  Ok(result.rows_affected() > 0)
}

pub async fn clear<'e, E: PgExecutor<'e>>(executor: E, user_id: i64) -> Result<u64, sqlx::Error> {
  let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
    .bind(user_id)
    .execute(executor)
    .await?;
  Ok(result.rows_affected())
}

/// Drops the lines an order from `store_id` just covered.
pub async fn clear_store<'e, E: PgExecutor<'e>>(executor: E, user_id: i64, store_id: i64) -> Result<u64, sqlx::Error> {
  let result = sqlx::query(
    "DELETE FROM cart_items c USING products p \
     WHERE c.product_id = p.id AND c.user_id = $1 AND p.store_id = $2",
  )
  .bind(user_id)
  .bind(store_id)
  .execute(executor)
  .await?;
  Ok(result.rows_affected())
}
