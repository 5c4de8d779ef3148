// server/src/web/extractors.rs

use crate::errors::{AppError, ADMIN_ONLY};
use crate::services::session_registry::Principal;
use crate::state::AppState;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use baoleme_core::domain::Role;
use futures_util::future::{ready, Ready};
use tracing::warn;

/// The caller behind a valid token with a live session.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal {
  pub principal: Principal,
  pub username: String,
  pub token: String,
}

impl AuthenticatedPrincipal {
  pub fn id(&self) -> i64 {
    self.principal.id
  }

  pub fn role(&self) -> Role {
    self.principal.role
  }

  /// The caller's id if they act as `role`.
  pub fn require(&self, role: Role) -> Result<i64, AppError> {
    if self.principal.role == role {
      return Ok(self.principal.id);
    }
    warn!(expected = %role, actual = %self.principal.role, "Role check failed.");
    let message = match role {
      Role::Admin => ADMIN_ONLY.to_string(),
      Role::User => "无权限访问，仅用户可操作".to_string(),
      Role::Merchant => "无权限访问，仅商家可操作".to_string(),
      Role::Rider => "无权限访问，仅骑手可操作".to_string(),
    };
    Err(AppError::Forbidden(message))
  }
}

/// `Bearer <token>` or the bare token.
pub fn bearer_token(header_value: &str) -> Option<&str> {
  let value = header_value.trim();
  let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
  (!token.is_empty()).then_some(token)
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedPrincipal, AppError> {
  let state = req
    .app_data::<web::Data<AppState>>()
    .ok_or_else(|| AppError::Internal("application state is not configured".to_string()))?;
  let token = req
    .headers()
    .get(AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(bearer_token)
    .ok_or_else(AppError::token_invalid)?;

  let claims = state.tokens.verify(token)?;
  let principal = state.sessions.resolve(token).ok_or_else(|| {
    warn!(user_id = claims.user_id, "Token has no live session.");
    AppError::token_invalid()
  })?;
  if principal != Principal::new(claims.role, claims.user_id) {
    warn!("Token claims do not match the session.");
    return Err(AppError::token_invalid());
  }
  Ok(AuthenticatedPrincipal {
    principal,
    username: claims.username,
    token: token.to_string(),
  })
}

impl FromRequest for AuthenticatedPrincipal {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    ready(authenticate(req))
  }
}

#[cfg(test)]
mod tests {
  use super::bearer_token;

  #[test]
  fn accepts_bearer_and_bare_tokens() {
    assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
    assert_eq!(bearer_token("  abc.def "), Some("abc.def"));
    assert_eq!(bearer_token("Bearer   "), None);
    assert_eq!(bearer_token(""), None);
  }
}
