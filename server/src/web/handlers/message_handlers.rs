// server/src/web/handlers/message_handlers.rs

use actix_web::{web, HttpResponse};
use baoleme_core::domain::Role;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{debug, instrument};
use validator::Validate;

use super::{not_blank, validated, PageQuery};
use crate::db;
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedPrincipal;
use crate::web::response::ok;

fn parse_role(raw: &str) -> Result<Role, AppError> {
  raw
    .parse::<Role>()
    .map_err(|_| AppError::Validation(format!("无效的角色: {}", raw)))
}

async fn account_exists(pool: &PgPool, id: i64, role: Role) -> Result<bool, AppError> {
  let found = match role {
    Role::User => db::users::find_by_id(pool, id).await?.is_some(),
    Role::Merchant => db::merchants::find_by_id(pool, id).await?.is_some(),
    Role::Rider => db::riders::find_by_id(pool, id).await?.is_some(),
    Role::Admin => db::admins::find_by_id(pool, id).await?.is_some(),
  };
  Ok(found)
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
  pub receiver_id: i64,
  pub receiver_role: String,
  #[validate(length(min = 1, max = 500, message = "消息内容长度应为1~500个字符"))]
  #[validate(custom(function = "not_blank", message = "消息内容不能为空"))]
  pub content: String,
}

#[instrument(name = "handler::send_message", skip_all, fields(sender_role = %auth.role(), sender_id = auth.id(), receiver_id = payload.receiver_id))]
pub async fn send(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, AppError> {
  let req = validated(payload.into_inner())?;
  let receiver_role = parse_role(&req.receiver_role)?;
  if !account_exists(&state.db_pool, req.receiver_id, receiver_role).await? {
    return Err(AppError::NotFound("接收方不存在".to_string()));
  }
  let message = db::messages::insert(
    &state.db_pool,
    (auth.id(), auth.role()),
    (req.receiver_id, receiver_role),
    &req.content,
  )
  .await?;
  debug!(message_id = message.id, "Message stored.");
  Ok(ok(message))
}

#[derive(Debug, Deserialize)]
pub struct HistoryRequest {
  pub target_id: i64,
  pub target_role: String,
  #[serde(flatten)]
  pub page: PageQuery,
}

/// Both directions of the conversation with one counterpart, newest first.
pub async fn history(
  state: web::Data<AppState>,
  auth: AuthenticatedPrincipal,
  payload: web::Json<HistoryRequest>,
) -> Result<HttpResponse, AppError> {
  let target_role = parse_role(&payload.target_role)?;
  let page = db::messages::conversation(
    &state.db_pool,
    (auth.id(), auth.role()),
    (payload.target_id, target_role),
    payload.page.request()?,
  )
  .await?;
  Ok(ok(page))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn roles_parse_or_fail_validation() {
    assert_eq!(parse_role("merchant").ok(), Some(Role::Merchant));
    assert!(matches!(parse_role("courier"), Err(AppError::Validation(_))));
  }

  #[test]
  fn content_length_is_bounded() {
    let long = SendMessageRequest {
      receiver_id: 1,
      receiver_role: "user".to_string(),
      content: "好".repeat(501),
    };
    assert!(long.validate().is_err());
    let blank = SendMessageRequest { content: "   ".to_string(), ..long };
    assert!(blank.validate().is_err());
  }
}
