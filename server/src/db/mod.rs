// server/src/db/mod.rs

//! Data access. Every function is a thin wrapper around one or two SQL statements;
//! business checks live in the pipelines and handlers.

pub mod admins;
pub mod carts;
pub mod coupons;
pub mod favorites;
pub mod merchants;
pub mod messages;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod riders;
pub mod sales;
pub mod stores;
pub mod users;

use baoleme_core::domain::{Page, PageRequest};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

/// Counts and fetches one page of `base` narrowed by `push_filters`.
///
/// `base` is a `SELECT ... FROM ... WHERE <condition>` statement; filters are
/// appended as `AND ...` clauses, once for the count and once for the page.
pub async fn fetch_page<T, F>(
  pool: &PgPool,
  base: &str,
  order_by: &str,
  req: PageRequest,
  push_filters: F,
) -> Result<Page<T>, sqlx::Error>
where
  T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
  F: for<'q> Fn(&mut QueryBuilder<'q, Postgres>),
{
  let count = count_matching(pool, base, &push_filters).await?;
  let list = fetch_slice(pool, base, order_by, req, &push_filters).await?;
  Ok(Page::new(req, count, list))
}

/// Like [`fetch_page`] but a page past the end is moved back onto the last page.
pub async fn fetch_page_clamped<T, F>(
  pool: &PgPool,
  base: &str,
  order_by: &str,
  req: PageRequest,
  push_filters: F,
) -> Result<Page<T>, sqlx::Error>
where
  T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
  F: for<'q> Fn(&mut QueryBuilder<'q, Postgres>),
{
  let count = count_matching(pool, base, &push_filters).await?;
  let req = req.clamp_to(count);
  let list = fetch_slice(pool, base, order_by, req, &push_filters).await?;
  Ok(Page::new(req, count, list))
}

async fn count_matching<F>(pool: &PgPool, base: &str, push_filters: &F) -> Result<i64, sqlx::Error>
where
  F: for<'q> Fn(&mut QueryBuilder<'q, Postgres>),
{
  let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM (");
  qb.push(base);
  push_filters(&mut qb);
  qb.push(") AS matching");
  qb.build_query_scalar::<i64>().fetch_one(pool).await
}

async fn fetch_slice<T, F>(
  pool: &PgPool,
  base: &str,
  order_by: &str,
  req: PageRequest,
  push_filters: &F,
) -> Result<Vec<T>, sqlx::Error>
where
  T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
  F: for<'q> Fn(&mut QueryBuilder<'q, Postgres>),
{
  let mut qb = QueryBuilder::<Postgres>::new(base);
  push_filters(&mut qb);
  qb.push(" ORDER BY ").push(order_by);
  qb.push(" LIMIT ").push_bind(req.limit());
  qb.push(" OFFSET ").push_bind(req.offset());
  qb.build_query_as::<T>().fetch_all(pool).await
}

/// `%keyword%` for ILIKE, with the wildcard characters escaped.
pub fn like_pattern(keyword: &str) -> String {
  let escaped = keyword.trim().replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
  format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
  use super::like_pattern;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern(" 麻辣 "), "%麻辣%");
    assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
  }

  const INIT_SQL: &str = include_str!("../../migrations/0001_init.sql");

  fn column_line(table: &str, column: &str) -> &'static str {
    let start = INIT_SQL.find(&format!("CREATE TABLE {} (", table)).unwrap();
    let body = &INIT_SQL[start..];
    let body = &body[..body.find(");").unwrap()];
    body.lines().find(|line| line.trim_start().starts_with(column)).unwrap()
  }

  #[test]
  fn claimed_coupons_leave_with_their_owner() {
    assert!(column_line("coupons", "user_id").contains("ON DELETE CASCADE"));
  }
}
