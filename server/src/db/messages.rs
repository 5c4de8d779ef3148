// server/src/db/messages.rs

use super::fetch_page;
use crate::models::Message;
use baoleme_core::domain::{Page, PageRequest, Role};
use sqlx::{PgExecutor, PgPool};

const MESSAGE_COLUMNS: &str = "id, sender_id, sender_role, receiver_id, receiver_role, content, created_at";

pub async fn insert<'e, E: PgExecutor<'e>>(
  executor: E,
  sender: (i64, Role),
  receiver: (i64, Role),
  content: &str,
) -> Result<Message, sqlx::Error> {
  sqlx::query_as::<_, Message>(&format!(
    "INSERT INTO messages (sender_id, sender_role, receiver_id, receiver_role, content) \
     VALUES ($1, $2, $3, $4, $5) RETURNING {}",
    MESSAGE_COLUMNS
  ))
  .bind(sender.0)
  .bind(sender.1.as_str())
  .bind(receiver.0)
  .bind(receiver.1.as_str())
  .bind(content)
  .fetch_one(executor)
  .await
}

/// Both directions of one conversation, newest first.
pub async fn conversation(
  pool: &PgPool,
  me: (i64, Role),
  other: (i64, Role),
  req: PageRequest,
) -> Result<Page<Message>, sqlx::Error> {
  let base = format!("SELECT {} FROM messages WHERE TRUE", MESSAGE_COLUMNS);
  fetch_page(pool, &base, "created_at DESC, id DESC", req, |qb| {
    qb.push(" AND ((sender_id = ")
      .push_bind(me.0)
      .push(" AND sender_role = ")
      .push_bind(me.1.as_str())
      .push(" AND receiver_id = ")
      .push_bind(other.0)
      .push(" AND receiver_role = ")
      .push_bind(other.1.as_str())
      .push(") OR (sender_id = ")
      .push_bind(other.0)
      .push(" AND sender_role = ")
      .push_bind(other.1.as_str())
      .push(" AND receiver_id = ")
      .push_bind(me.0)
      .push(" AND receiver_role = ")
      .push_bind(me.1.as_str())
      .push("))");
  })
  .await
}
