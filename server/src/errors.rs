// server/src/errors.rs

use crate::web::response::ApiResponse;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use baoleme_core::{FlowError, RuleViolation};
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Rule Violation: {0}")]
  Rule(#[from] RuleViolation),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),

  #[error("Pipeline execution was halted by a handler.")]
  PipelineHaltedByHandler,
}

pub const TOKEN_INVALID: &str = "Token 无效或已过期";
pub const ADMIN_ONLY: &str = "无权限访问，仅管理员可操作";

impl AppError {
  pub fn token_invalid() -> Self {
    AppError::Auth(TOKEN_INVALID.to_string())
  }

  fn is_unique_violation(&self) -> bool {
    matches!(self, AppError::Sqlx(sqlx::Error::Database(db)) if db.is_unique_violation())
  }

  /// Text placed in the envelope. Server-side failures are not described to clients.
  pub fn public_message(&self) -> String {
    match self {
      AppError::Validation(m)
      | AppError::Auth(m)
      | AppError::Forbidden(m)
      | AppError::NotFound(m)
      | AppError::Conflict(m) => m.clone(),
      AppError::Rule(violation) => violation.to_string(),
      AppError::PipelineHaltedByHandler => "请求已被业务规则终止".to_string(),
      AppError::Sqlx(_) if self.is_unique_violation() => "数据已存在".to_string(),
      AppError::Sqlx(sqlx::Error::RowNotFound) => "数据不存在".to_string(),
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        "服务器内部错误".to_string()
      }
    }
  }
}

// Lets `?` work on `anyhow::Result` without losing the original variant.
impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    let err = match err.downcast::<AppError>() {
      Ok(app_err) => return app_err,
      Err(err) => err,
    };
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(err) => AppError::Internal(err.to_string()),
    }
  }
}

impl From<ValidationErrors> for AppError {
  fn from(errors: ValidationErrors) -> Self {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    let message = fields
      .into_iter()
      .flat_map(|(field, errs)| {
        errs.iter().map(move |e| match &e.message {
          Some(msg) => msg.to_string(),
          None => format!("{}: {}", field, e.code),
        })
      })
      .collect::<Vec<_>>()
      .join("; ");
    AppError::Validation(message)
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::Rule(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) | AppError::PipelineHaltedByHandler => StatusCode::CONFLICT,
      AppError::Sqlx(_) if self.is_unique_violation() => StatusCode::CONFLICT,
      AppError::Sqlx(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with error");
    }
    HttpResponse::build(status).json(ApiResponse::<()>::failure(status.as_u16(), self.public_message()))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::body::to_bytes;
  use validator::Validate;

  #[derive(Validate)]
  struct Probe {
    #[validate(length(min = 2, message = "用户名长度应为2~20个字符"))]
    username: String,
    #[validate(range(min = 1))]
    quantity: i32,
  }

  #[test]
  fn statuses_follow_the_taxonomy() {
    assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::from(RuleViolation::EmptyOrder).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::token_invalid().status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::Forbidden(ADMIN_ONLY.into()).status_code(), StatusCode::FORBIDDEN);
    assert_eq!(AppError::Sqlx(sqlx::Error::RowNotFound).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::PipelineHaltedByHandler.status_code(), StatusCode::CONFLICT);
    assert_eq!(
      AppError::from(FlowError::NotRegistered { context_type: "X".into() }).status_code(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }

  #[test]
  fn anyhow_keeps_the_original_variant() {
    let wrapped = anyhow::Error::new(AppError::NotFound("店铺不存在".into()));
    assert!(matches!(AppError::from(wrapped), AppError::NotFound(m) if m == "店铺不存在"));
    assert!(matches!(AppError::from(anyhow::anyhow!("boom")), AppError::Internal(_)));
  }

  #[test]
  fn validation_errors_are_flattened() {
    let probe = Probe {
      username: "a".into(),
      quantity: 0,
    };
    let err = AppError::from(probe.validate().unwrap_err());
    let AppError::Validation(message) = err else {
      panic!("expected a validation error");
    };
    assert!(message.contains("用户名长度应为2~20个字符"));
    assert!(message.contains("quantity: range"));
  }

  #[actix_web::test]
  async fn error_body_is_the_envelope() {
    let response = AppError::Internal("db exploded".into()).error_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = to_bytes(response.into_body()).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["code"], 500);
    assert_eq!(json["message"], "服务器内部错误");
    assert!(json["data"].is_null());
  }
}
