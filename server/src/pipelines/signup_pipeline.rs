// server/src/pipelines/signup_pipeline.rs

use crate::db;
use crate::db::users::NewUser;
use crate::errors::AppError;
use crate::pipelines::common_steps;
use crate::pipelines::contexts::SignupCtxData;
use crate::services::auth_service;
use baoleme_core::domain::Role;
use baoleme_core::{ContextData, FlowError, Pipeline, PipelineRegistry, StepControl};
use tracing::{event, info, instrument, Level};

/// Registers account creation for users, merchants and riders.
pub fn register_signup_pipeline(registry: &PipelineRegistry<AppError>) -> Result<(), FlowError> {
  let mut p = Pipeline::<SignupCtxData, AppError>::new(
    "signup",
    &[
      ("check_existing_account", false, None),
      ("hash_password", false, None),
      ("create_account", false, None),
    ],
  );

  p.on("check_existing_account", check_existing_account);
  p.on("hash_password", hash_password);
  p.on("create_account", create_account);

  registry.register(p)?;
  info!("Sign-up pipeline registered.");
  Ok(())
}

#[instrument(name = "signup::check_existing_account", skip(ctx))]
async fn check_existing_account(ctx: ContextData<SignupCtxData>) -> Result<StepControl, AppError> {
  let (pool, role, username, phone) = {
    let guard = ctx.read();
    (
      guard.app_state.db_pool.clone(),
      guard.role,
      guard.form.username.clone(),
      guard.form.phone.clone(),
    )
  };
  if role == Role::Admin {
    return Err(AppError::Forbidden("管理员账号不支持注册".to_string()));
  }
  common_steps::ensure_unique_identity(&pool, role, Some(&username), Some(&phone), None).await?;
  Ok(StepControl::Continue)
}

#[instrument(name = "signup::hash_password", skip(ctx))]
async fn hash_password(ctx: ContextData<SignupCtxData>) -> Result<StepControl, AppError> {
  let password = ctx.read().form.password.clone();
  let hashed = auth_service::hash_password(&password)?;
  ctx.write().password_hash = Some(hashed);
  Ok(StepControl::Continue)
}

#[instrument(name = "signup::create_account", skip(ctx))]
async fn create_account(ctx: ContextData<SignupCtxData>) -> Result<StepControl, AppError> {
  let (pool, role, form, password_hash) = {
    let guard = ctx.read();
    (
      guard.app_state.db_pool.clone(),
      guard.role,
      guard.form.clone(),
      guard.password_hash.clone(),
    )
  };
  let password_hash =
    password_hash.ok_or_else(|| AppError::Internal("password hash missing before account creation".to_string()))?;

  let created_id = match role {
    Role::User => {
      let user = db::users::insert(
        &pool,
        NewUser {
          username: &form.username,
          password_hash: &password_hash,
          phone: &form.phone,
          gender: form.gender.as_deref(),
          description: form.description.as_deref(),
          location: form.location.as_deref(),
          avatar: form.avatar.as_deref(),
        },
      )
      .await?;
      user.id
    }
    Role::Merchant => {
      db::merchants::insert(&pool, &form.username, &password_hash, &form.phone, form.avatar.as_deref())
        .await?
        .id
    }
    Role::Rider => {
      db::riders::insert(&pool, &form.username, &password_hash, &form.phone, form.avatar.as_deref())
        .await?
        .id
    }
    Role::Admin => return Err(AppError::Forbidden("管理员账号不支持注册".to_string())),
  };

  ctx.write().created_id = Some(created_id);
  event!(Level::INFO, %role, id = created_id, "Account created.");
  Ok(StepControl::Continue)
}
