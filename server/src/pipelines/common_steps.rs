// server/src/pipelines/common_steps.rs

//! Checks shared by several pipelines and by the profile-update handlers.

use crate::db;
use crate::errors::AppError;
use baoleme_core::domain::Role;
use sqlx::PgPool;
use tracing::{instrument, warn};

pub const USERNAME_TAKEN: &str = "用户名已存在";
pub const PHONE_TAKEN: &str = "手机号已被注册";

/// Fails when `username` or `phone` already belongs to another account of the same role.
#[instrument(name = "common_steps::ensure_unique_identity", skip(pool, username, phone), fields(%role), err(Display))]
pub async fn ensure_unique_identity(
  pool: &PgPool,
  role: Role,
  username: Option<&str>,
  phone: Option<&str>,
  except_id: Option<i64>,
) -> Result<(), AppError> {
  if let Some(username) = username {
    let taken = match role {
      Role::User => db::users::username_taken(pool, username, except_id).await?,
      Role::Merchant => db::merchants::username_taken(pool, username, except_id).await?,
      Role::Rider => db::riders::username_taken(pool, username, except_id).await?,
      Role::Admin => false,
    };
    if taken {
      warn!("Username already in use.");
      return Err(AppError::Conflict(USERNAME_TAKEN.to_string()));
    }
  }
  if let Some(phone) = phone {
    let taken = match role {
      Role::User => db::users::phone_taken(pool, phone, except_id).await?,
      Role::Merchant => db::merchants::phone_taken(pool, phone, except_id).await?,
      Role::Rider => db::riders::phone_taken(pool, phone, except_id).await?,
      Role::Admin => false,
    };
    if taken {
      warn!("Phone already in use.");
      return Err(AppError::Conflict(PHONE_TAKEN.to_string()));
    }
  }
  Ok(())
}

/// Loads the store and checks that `merchant_id` owns it.
pub async fn owned_store(pool: &PgPool, store_id: i64, merchant_id: i64) -> Result<crate::models::Store, AppError> {
  let store = db::stores::find_by_id(pool, store_id)
    .await?
    .ok_or_else(|| AppError::NotFound("店铺不存在".to_string()))?;
  if store.merchant_id != merchant_id {
    warn!(store_id, merchant_id, "Store ownership check failed.");
    return Err(AppError::Forbidden(NOT_YOUR_STORE.to_string()));
  }
  Ok(store)
}

pub const NOT_YOUR_STORE: &str = "店铺不属于您";
