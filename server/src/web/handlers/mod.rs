// server/src/web/handlers/mod.rs

pub mod admin_handlers;
pub mod cart_handlers;
pub mod coupon_handlers;
pub mod merchant_handlers;
pub mod message_handlers;
pub mod order_handlers;
pub mod product_handlers;
pub mod review_handlers;
pub mod rider_handlers;
pub mod stats_handlers;
pub mod store_handlers;
pub mod user_handlers;

use crate::errors::AppError;
use crate::state::AppState;
use baoleme_core::domain::PageRequest;
use baoleme_core::{ContextData, FlowOutcome};
use serde::Deserialize;
use tracing::warn;
use validator::{Validate, ValidationError};

/// `page` / `page_size` accepted by every list endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
  pub page: Option<i64>,
  pub page_size: Option<i64>,
}

impl PageQuery {
  pub fn request(self) -> Result<PageRequest, AppError> {
    Ok(PageRequest::new(self.page, self.page_size)?)
  }
}

/// Runs the pipeline for `T`. A run stopped by a handler is reported as a conflict.
pub async fn run_pipeline<T>(state: &AppState, ctx: ContextData<T>) -> Result<(), AppError>
where
  T: Send + Sync + 'static,
{
  match state.pipelines.run(ctx).await? {
    FlowOutcome::Completed => Ok(()),
    FlowOutcome::Stopped => {
      warn!(context = std::any::type_name::<T>(), "Pipeline stopped before completion.");
      Err(AppError::PipelineHaltedByHandler)
    }
  }
}

pub fn validated<T: Validate>(payload: T) -> Result<T, AppError> {
  payload.validate()?;
  Ok(payload)
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
  if baoleme_core::validation::is_blank(value) {
    return Err(ValidationError::new("blank"));
  }
  Ok(())
}

/// Whitespace-only optional fields count as absent.
pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
  baoleme_core::validation::normalize_optional(value)
}

/// After a rename the old token still names the old username, so a fresh one replaces it.
pub(crate) fn reissue_token(
  state: &AppState,
  auth: &crate::web::extractors::AuthenticatedPrincipal,
  new_username: &str,
) -> Result<String, AppError> {
  let token = state.tokens.issue(auth.id(), auth.role(), new_username)?;
  state.sessions.replace(auth.principal, &token);
  tracing::info!(role = %auth.role(), id = auth.id(), "Token reissued after username change.");
  Ok(token)
}

#[derive(Debug, serde::Serialize)]
pub struct LoginResponse {
  pub token: String,
  pub id: i64,
  pub username: String,
}

/// Runs the sign-in pipeline for `role`.
pub(crate) async fn sign_in(
  state: &AppState,
  role: baoleme_core::domain::Role,
  login: String,
  password: String,
) -> Result<LoginResponse, AppError> {
  let ctx = ContextData::new(crate::pipelines::contexts::SigninCtxData {
    app_state: state.clone(),
    role,
    login,
    password,
    account_id: None,
    username: None,
    stored_hash: None,
    token: None,
  });
  run_pipeline(state, ctx.clone()).await?;
  let guard = ctx.read();
  match (guard.token.clone(), guard.account_id, guard.username.clone()) {
    (Some(token), Some(id), Some(username)) => Ok(LoginResponse { token, id, username }),
    _ => Err(AppError::Internal("sign-in finished without issuing a session".to_string())),
  }
}

/// Runs the sign-up pipeline and returns the new account id.
pub(crate) async fn sign_up(
  state: &AppState,
  role: baoleme_core::domain::Role,
  form: crate::pipelines::contexts::SignupForm,
) -> Result<i64, AppError> {
  let ctx = ContextData::new(crate::pipelines::contexts::SignupCtxData {
    app_state: state.clone(),
    role,
    form,
    password_hash: None,
    created_id: None,
  });
  run_pipeline(state, ctx.clone()).await?;
  let created = ctx.read().created_id;
  created.ok_or_else(|| AppError::Internal("sign-up finished without an account id".to_string()))
}
