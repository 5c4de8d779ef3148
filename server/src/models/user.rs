// server/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
  pub id: i64,
  pub username: String,
  #[serde(skip_serializing)]
  pub password: String,
  pub phone: String,
  pub description: Option<String>,
  pub location: Option<String>,
  pub gender: Option<String>,
  pub avatar: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Account row shape shared by the tables that log in with a password.
#[derive(Debug, Clone, FromRow)]
pub struct Credentials {
  pub id: i64,
  pub username: String,
  pub password: String,
}
