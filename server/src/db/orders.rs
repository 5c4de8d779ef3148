// server/src/db/orders.rs

use super::fetch_page;
use crate::models::{Order, OrderItemDetail, OrderSummary};
use baoleme_core::domain::{OrderStatus, Page, PageRequest};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};

const ORDER_COLUMNS: &str = "o.id, o.user_id, o.store_id, o.rider_id, o.status, o.user_location, o.store_location, \
   o.total_price, o.actual_price, o.delivery_price, o.remark, o.cancel_reason, o.created_at, o.deadline, o.ended_at";

pub struct NewOrder<'a> {
  pub user_id: i64,
  pub store_id: i64,
  pub user_location: &'a str,
  pub store_location: Option<&'a str>,
  pub total_price: Decimal,
  pub actual_price: Decimal,
  pub delivery_price: Decimal,
  pub remark: Option<&'a str>,
}

/// Filters shared by the customer, rider, merchant and admin order lists.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct OrderFilter {
  pub user_id: Option<i64>,
  pub store_id: Option<i64>,
  pub rider_id: Option<i64>,
  pub status: Option<i16>,
  pub start_time: Option<DateTime<Utc>>,
  pub end_time: Option<DateTime<Utc>>,
}

impl OrderFilter {
  fn push(&self, qb: &mut QueryBuilder<'_, Postgres>) {
    if let Some(user_id) = self.user_id {
      qb.push(" AND o.user_id = ").push_bind(user_id);
    }
    if let Some(store_id) = self.store_id {
      qb.push(" AND o.store_id = ").push_bind(store_id);
    }
    if let Some(rider_id) = self.rider_id {
      qb.push(" AND o.rider_id = ").push_bind(rider_id);
    }
    if let Some(status) = self.status {
      qb.push(" AND o.status = ").push_bind(status);
    }
    if let Some(start) = self.start_time {
      qb.push(" AND o.created_at >= ").push_bind(start);
    }
    if let Some(end) = self.end_time {
      qb.push(" AND o.created_at <= ").push_bind(end);
    }
  }
}

fn summary_base() -> String {
  format!(
    "SELECT {}, s.name AS store_name, r.username AS rider_name, m.phone AS merchant_phone \
     FROM orders o \
     JOIN stores s ON s.id = o.store_id \
     JOIN merchants m ON m.id = s.merchant_id \
     LEFT JOIN riders r ON r.id = o.rider_id \
     WHERE TRUE",
    ORDER_COLUMNS
  )
}

pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, new_order: NewOrder<'_>) -> Result<Order, sqlx::Error> {
  sqlx::query_as::<_, Order>(&format!(
    "INSERT INTO orders AS o (user_id, store_id, status, user_location, store_location, total_price, actual_price, \
       delivery_price, remark) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
    ORDER_COLUMNS
  ))
  .bind(new_order.user_id)
  .bind(new_order.store_id)
  .bind(OrderStatus::Pending.code())
  .bind(new_order.user_location)
  .bind(new_order.store_location)
  .bind(new_order.total_price)
  .bind(new_order.actual_price)
  .bind(new_order.delivery_price)
  .bind(new_order.remark)
  .fetch_one(executor)
  .await
}

pub async fn insert_item<'e, E: PgExecutor<'e>>(executor: E, order_id: i64, product_id: i64, quantity: i32) -> Result<(), sqlx::Error> {
  sqlx::query("INSERT INTO order_items (order_id, product_id, quantity) VALUES ($1, $2, $3)")
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .execute(executor)
    .await?;
  Ok(())
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<Order>, sqlx::Error> {
  sqlx::query_as::<_, Order>(&format!("SELECT {} FROM orders o WHERE o.id = $1", ORDER_COLUMNS))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn find_for_update<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<Order>, sqlx::Error> {
  sqlx::query_as::<_, Order>(&format!("SELECT {} FROM orders o WHERE o.id = $1 FOR UPDATE", ORDER_COLUMNS))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn find_summary<'e, E: PgExecutor<'e>>(executor: E, id: i64) -> Result<Option<OrderSummary>, sqlx::Error> {
  sqlx::query_as::<_, OrderSummary>(&format!("{} AND o.id = $1", summary_base()))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn items<'e, E: PgExecutor<'e>>(executor: E, order_id: i64) -> Result<Vec<OrderItemDetail>, sqlx::Error> {
  sqlx::query_as::<_, OrderItemDetail>(
    "SELECT oi.product_id, p.name AS product_name, p.price, oi.quantity, p.image \
     FROM order_items oi JOIN products p ON p.id = oi.product_id \
     WHERE oi.order_id = $1 ORDER BY oi.product_id",
  )
  .bind(order_id)
  .fetch_all(executor)
  .await
}

pub async fn list(pool: &PgPool, filter: &OrderFilter, req: PageRequest) -> Result<Page<OrderSummary>, sqlx::Error> {
  fetch_page(pool, &summary_base(), "o.created_at DESC, o.id DESC", req, |qb| filter.push(qb)).await
}

/// The user's orders that are still in flight.
pub async fn list_current(pool: &PgPool, user_id: i64, req: PageRequest) -> Result<Page<OrderSummary>, sqlx::Error> {
  let active: Vec<i16> = OrderStatus::ACTIVE.iter().map(|s| s.code()).collect();
  fetch_page(pool, &summary_base(), "o.created_at DESC, o.id DESC", req, |qb| {
    qb.push(" AND o.user_id = ").push_bind(user_id);
    qb.push(" AND o.status = ANY(").push_bind(active.clone()).push(")");
  })
  .await
}

/// Pending orders nobody has taken yet, newest first.
pub async fn list_available(pool: &PgPool, req: PageRequest) -> Result<Page<OrderSummary>, sqlx::Error> {
  fetch_page(pool, &summary_base(), "o.created_at DESC, o.id DESC", req, |qb| {
    qb.push(" AND o.rider_id IS NULL AND o.status = ")
      .push_bind(OrderStatus::Pending.code());
  })
  .await
}

pub async fn random_available_id<'e, E: PgExecutor<'e>>(executor: E) -> Result<Option<i64>, sqlx::Error> {
  sqlx::query_scalar::<_, i64>("SELECT id FROM orders WHERE rider_id IS NULL AND status = $1 ORDER BY random() LIMIT 1")
    .bind(OrderStatus::Pending.code())
    .fetch_optional(executor)
    .await
}

/// Assigns a pending order to `rider_id`. `None` if it was taken or does not exist.
pub async fn assign_rider<'e, E: PgExecutor<'e>>(
  executor: E,
  order_id: i64,
  rider_id: i64,
  deadline: DateTime<Utc>,
) -> Result<Option<Order>, sqlx::Error> {
  sqlx::query_as::<_, Order>(&format!(
    "UPDATE orders AS o SET rider_id = $2, status = $3, deadline = $4 \
     WHERE o.id = $1 AND o.rider_id IS NULL AND o.status = $5 RETURNING {}",
    ORDER_COLUMNS
  ))
  .bind(order_id)
  .bind(rider_id)
  .bind(OrderStatus::Accepted.code())
  .bind(deadline)
  .bind(OrderStatus::Pending.code())
  .fetch_optional(executor)
  .await
}

/// Puts an accepted order back into the pool.
pub async fn release_rider<'e, E: PgExecutor<'e>>(executor: E, order_id: i64, rider_id: i64) -> Result<bool, sqlx::Error> {
  let result = sqlx::query(
    "UPDATE orders SET rider_id = NULL, status = $3, deadline = NULL \
     WHERE id = $1 AND rider_id = $2 AND status = $4",
  )
  .bind(order_id)
  .bind(rider_id)
  .bind(OrderStatus::Pending.code())
  .bind(OrderStatus::Accepted.code())
  .execute(executor)
  .await?;
  Ok(result.rows_affected() == 1)
}

/// Moves the order only if it is still in `from`.
pub async fn transition<'e, E: PgExecutor<'e>>(
  executor: E,
  order_id: i64,
  from: OrderStatus,
  to: OrderStatus,
  cancel_reason: Option<&str>,
) -> Result<bool, sqlx::Error> {
  let result = sqlx::query(
    "UPDATE orders SET status = $3, \
       cancel_reason = COALESCE($4, cancel_reason), \
       ended_at = CASE WHEN $3 IN ($5, $6) THEN NOW() ELSE ended_at END \
     WHERE id = $1 AND status = $2",
  )
  .bind(order_id)
  .bind(from.code())
  .bind(to.code())
  .bind(cancel_reason)
  .bind(OrderStatus::Completed.code())
  .bind(OrderStatus::Cancelled.code())
  .execute(executor)
  .await?;
  Ok(result.rows_affected() == 1)
}
