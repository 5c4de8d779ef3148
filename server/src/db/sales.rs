// server/src/db/sales.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};

/// Writes one sale row per order line, priced at the current product price.
pub async fn record_order<'e, E: PgExecutor<'e>>(executor: E, order_id: i64, sale_date: NaiveDate) -> Result<u64, sqlx::Error> {
  let result = sqlx::query(
    "INSERT INTO sales (product_id, store_id, sale_date, quantity, unit_price, total_amount, payment_method, customer_id) \
     SELECT oi.product_id, o.store_id, $2, oi.quantity, p.price, p.price * oi.quantity, 'ONLINE', o.user_id \
     FROM order_items oi \
     JOIN orders o ON o.id = oi.order_id \
     JOIN products p ON p.id = oi.product_id \
     WHERE oi.order_id = $1",
  )
  .bind(order_id)
  .bind(sale_date)
  .execute(executor)
  .await?;
  Ok(result.rows_affected())
}

pub async fn total_amount<'e, E: PgExecutor<'e>>(
  executor: E,
  store_id: i64,
  start: NaiveDate,
  end: NaiveDate,
) -> Result<Decimal, sqlx::Error> {
  sqlx::query_scalar::<_, Decimal>(
    "SELECT COALESCE(SUM(total_amount), 0) FROM sales WHERE store_id = $1 AND sale_date BETWEEN $2 AND $3",
  )
  .bind(store_id)
  .bind(start)
  .bind(end)
  .fetch_one(executor)
  .await
}

/// Orders completed in the window, counted by completion day.
pub async fn completed_orders<'e, E: PgExecutor<'e>>(
  executor: E,
  store_id: i64,
  start: NaiveDate,
  end: NaiveDate,
) -> Result<i64, sqlx::Error> {
  sqlx::query_scalar::<_, i64>(
    "SELECT COUNT(*) FROM orders \
     WHERE store_id = $1 AND status = 3 AND (ended_at AT TIME ZONE 'UTC')::date BETWEEN $2 AND $3",
  )
  .bind(store_id)
  .bind(start)
  .bind(end)
  .fetch_one(executor)
  .await
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductSales {
  pub product_id: i64,
  pub product_name: String,
  pub quantity: i64,
}

/// Best sellers by units since `since`.
pub async fn popular_products<'e, E: PgExecutor<'e>>(
  executor: E,
  store_id: i64,
  since: NaiveDate,
  limit: i64,
) -> Result<Vec<ProductSales>, sqlx::Error> {
  sqlx::query_as::<_, ProductSales>(
    "SELECT sa.product_id, p.name AS product_name, SUM(sa.quantity)::BIGINT AS quantity \
     FROM sales sa JOIN products p ON p.id = sa.product_id \
     WHERE sa.store_id = $1 AND sa.sale_date >= $2 \
     GROUP BY sa.product_id, p.name \
     ORDER BY quantity DESC, sa.product_id \
     LIMIT $3",
  )
  .bind(store_id)
  .bind(since)
  .bind(limit)
  .fetch_all(executor)
  .await
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PriceVolume {
  pub unit_price: Decimal,
  pub quantity: i64,
}

/// Units sold at each price for the given products.
pub async fn price_volumes<'e, E: PgExecutor<'e>>(
  executor: E,
  store_id: i64,
  product_ids: &[i64],
  since: NaiveDate,
) -> Result<Vec<PriceVolume>, sqlx::Error> {
  sqlx::query_as::<_, PriceVolume>(
    "SELECT unit_price, SUM(quantity)::BIGINT AS quantity FROM sales \
     WHERE store_id = $1 AND product_id = ANY($2) AND sale_date >= $3 \
     GROUP BY unit_price",
  )
  .bind(store_id)
  .bind(product_ids)
  .bind(since)
  .fetch_all(executor)
  .await
}

#[derive(Debug, Clone, FromRow)]
pub struct DailyTotal {
  pub sale_date: NaiveDate,
  pub amount: Decimal,
}

pub async fn daily_totals<'e, E: PgExecutor<'e>>(
  executor: E,
  store_id: i64,
  start: NaiveDate,
  end: NaiveDate,
) -> Result<Vec<DailyTotal>, sqlx::Error> {
  sqlx::query_as::<_, DailyTotal>(
    "SELECT sale_date, SUM(total_amount) AS amount FROM sales \
     WHERE store_id = $1 AND sale_date BETWEEN $2 AND $3 \
     GROUP BY sale_date ORDER BY sale_date",
  )
  .bind(store_id)
  .bind(start)
  .bind(end)
  .fetch_all(executor)
  .await
}

pub async fn product_volume<'e, E: PgExecutor<'e>>(executor: E, product_id: i64) -> Result<i64, sqlx::Error> {
  sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM sales WHERE product_id = $1")
    .bind(product_id)
    .fetch_one(executor)
    .await
}
