// server/src/pipelines/signin_pipeline.rs

use crate::db;
use crate::errors::AppError;
use crate::pipelines::contexts::SigninCtxData;
use crate::services::auth_service;
use crate::services::session_registry::Principal;
use baoleme_core::domain::{RiderState, Role};
use baoleme_core::{ContextData, FlowError, Pipeline, PipelineRegistry, StepControl, StepDef};
use tracing::{info, instrument, warn};

pub const BAD_CREDENTIALS: &str = "账号或密码错误";

/// Login for every role. Riders come online before the session opens.
fn build_signin_pipeline() -> Pipeline<SigninCtxData, AppError> {
  let mut p = Pipeline::<SigninCtxData, AppError>::from_steps(
    "signin",
    vec![
      StepDef::required("load_credentials"),
      StepDef::required("verify_password"),
      StepDef::required("mark_rider_online").skip_when(|ctx: &ContextData<SigninCtxData>| ctx.read().role != Role::Rider),
      StepDef::required("open_session"),
    ],
  );

  p.on("load_credentials", load_credentials);
  p.on("verify_password", verify_password);
  p.on("mark_rider_online", mark_rider_online);
  p.on("open_session", open_session);
  p
}

pub fn register_signin_pipeline(registry: &PipelineRegistry<AppError>) -> Result<(), FlowError> {
  registry.register(build_signin_pipeline())?;
  info!("Sign-in pipeline registered.");
  Ok(())
}

#[instrument(name = "signin::load_credentials", skip(ctx))]
async fn load_credentials(ctx: ContextData<SigninCtxData>) -> Result<StepControl, AppError> {
  let (pool, role, login) = {
    let guard = ctx.read();
    (guard.app_state.db_pool.clone(), guard.role, guard.login.trim().to_string())
  };

  let found = match role {
    Role::User => db::users::credentials_by_phone(&pool, &login)
      .await?
      .map(|c| (c.id, c.username, c.password)),
    Role::Merchant => db::merchants::credentials_by_username(&pool, &login)
      .await?
      .map(|c| (c.id, c.username, c.password)),
    Role::Rider => db::riders::credentials_by_phone(&pool, &login)
      .await?
      .map(|c| (c.id, c.username, c.password)),
    Role::Admin => match login.parse::<i64>() {
      Ok(admin_id) => db::admins::find_by_id(&pool, admin_id)
        .await?
        .map(|a| (a.id, format!("admin{}", a.id), a.password)),
      Err(_) => None,
    },
  };

  let Some((id, username, hash)) = found else {
    warn!(%role, "Login for unknown account.");
    return Err(AppError::Auth(BAD_CREDENTIALS.to_string()));
  };
  ctx.update(|data| {
    data.account_id = Some(id);
    data.username = Some(username);
    data.stored_hash = Some(hash);
  });
  Ok(StepControl::Continue)
}

#[instrument(name = "signin::verify_password", skip(ctx))]
async fn verify_password(ctx: ContextData<SigninCtxData>) -> Result<StepControl, AppError> {
  let (hash, password) = {
    let guard = ctx.read();
    (guard.stored_hash.clone().unwrap_or_default(), guard.password.clone())
  };
  if !auth_service::verify_password(&hash, &password)? {
    warn!("Password mismatch.");
    return Err(AppError::Auth(BAD_CREDENTIALS.to_string()));
  }
  Ok(StepControl::Continue)
}

#[instrument(name = "signin::open_session", skip(ctx))]
async fn open_session(ctx: ContextData<SigninCtxData>) -> Result<StepControl, AppError> {
  let (state, role, id, username) = {
    let guard = ctx.read();
    (
      guard.app_state.clone(),
      guard.role,
      guard.account_id,
      guard.username.clone().unwrap_or_default(),
    )
  };
  let id = id.ok_or_else(|| AppError::Internal("account id missing after credential check".to_string()))?;
  let principal = Principal::new(role, id);

  let token = state.tokens.issue(id, role, &username)?;
  state.sessions.open(principal, &token)?;
  ctx.write().token = Some(token);
  info!(%role, id, "Session opened.");
  Ok(StepControl::Continue)
}

#[instrument(name = "signin::mark_rider_online", skip(ctx))]
async fn mark_rider_online(ctx: ContextData<SigninCtxData>) -> Result<StepControl, AppError> {
  let (pool, id) = {
    let guard = ctx.read();
    (guard.app_state.db_pool.clone(), guard.account_id)
  };
  if let Some(rider_id) = id {
    // A rider who logs back in while still carrying orders stays busy.
    db::riders::set_state(&pool, rider_id, RiderState::Idle).await?;
    db::riders::settle_state(&pool, rider_id).await?;
  }
  Ok(StepControl::Continue)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn riders_come_online_before_the_session_opens() {
    let pipeline = build_signin_pipeline();
    assert_eq!(
      pipeline.step_names(),
      vec!["load_credentials", "verify_password", "mark_rider_online", "open_session"]
    );
  }
}
