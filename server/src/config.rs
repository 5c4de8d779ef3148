// server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::ops::RangeInclusive;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub database_max_connections: u32,

  pub jwt_secret: String,
  pub token_ttl_hours: i64,

  /// How long a rider has to pick up an order after grabbing it.
  pub pickup_window_minutes: i64,

  pub run_migrations: bool,
  /// Creates the first admin account when set and none exists.
  pub admin_bootstrap_password: Option<String>,
}

fn parse_var<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match raw {
    None => Ok(default),
    Some(value) => value
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, value, e))),
  }
}

const TOKEN_TTL_HOURS_RANGE: RangeInclusive<i64> = 1..=720;
const PICKUP_WINDOW_MINUTES_RANGE: RangeInclusive<i64> = 1..=1440;

fn within(name: &str, value: i64, range: RangeInclusive<i64>) -> Result<i64> {
  if range.contains(&value) {
    return Ok(value);
  }
  Err(AppError::Config(format!(
    "{} must be between {} and {}, got {}",
    name,
    range.start(),
    range.end(),
    value
  )))
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = parse_var("SERVER_PORT", get_env("SERVER_PORT").ok(), 8080u16)?;
    let database_url = get_env("DATABASE_URL")?;
    let database_max_connections = parse_var("DATABASE_MAX_CONNECTIONS", get_env("DATABASE_MAX_CONNECTIONS").ok(), 10u32)?;

    let jwt_secret = get_env("JWT_SECRET")?;
    if jwt_secret.trim().is_empty() {
      return Err(AppError::Config("JWT_SECRET must not be blank".to_string()));
    }
    let token_ttl_hours = within(
      "TOKEN_TTL_HOURS",
      parse_var("TOKEN_TTL_HOURS", get_env("TOKEN_TTL_HOURS").ok(), 24i64)?,
      TOKEN_TTL_HOURS_RANGE,
    )?;
    let pickup_window_minutes = within(
      "PICKUP_WINDOW_MINUTES",
      parse_var("PICKUP_WINDOW_MINUTES", get_env("PICKUP_WINDOW_MINUTES").ok(), 30i64)?,
      PICKUP_WINDOW_MINUTES_RANGE,
    )?;

    let run_migrations = parse_var("RUN_MIGRATIONS", get_env("RUN_MIGRATIONS").ok(), true)?;
    let admin_bootstrap_password = get_env("ADMIN_BOOTSTRAP_PASSWORD")
      .ok()
      .filter(|p| !p.trim().is_empty());

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      jwt_secret,
      token_ttl_hours,
      pickup_window_minutes,
      run_migrations,
      admin_bootstrap_password,
    })
  }

  /// Settings for unit tests that never touch the network.
  #[cfg(test)]
  pub fn for_tests() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 0,
      database_url: "postgres://localhost/baoleme_test".to_string(),
      database_max_connections: 1,
      jwt_secret: "test-secret".to_string(),
      token_ttl_hours: 24,
      pickup_window_minutes: 30,
      run_migrations: false,
      admin_bootstrap_password: None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_values_use_defaults() {
    assert_eq!(parse_var("SERVER_PORT", None, 8080u16).unwrap(), 8080);
    assert!(parse_var("RUN_MIGRATIONS", Some(" false ".to_string()), true).map(|v| !v).unwrap());
  }

  const MANAGED_VARS: [&str; 6] = [
    "SERVER_PORT",
    "DATABASE_MAX_CONNECTIONS",
    "TOKEN_TTL_HOURS",
    "PICKUP_WINDOW_MINUTES",
    "RUN_MIGRATIONS",
    "ADMIN_BOOTSTRAP_PASSWORD",
  ];

  fn reset_env(jwt_secret: &str) {
    for name in MANAGED_VARS {
      env::remove_var(name);
    }
    env::set_var("DATABASE_URL", "postgres://localhost/baoleme");
    env::set_var("JWT_SECRET", jwt_secret);
  }

  #[test]
  #[serial_test::serial]
  fn from_env_fills_defaults() {
    reset_env("s3cret");
    env::set_var("ADMIN_BOOTSTRAP_PASSWORD", "   ");
    let config = AppConfig::from_env().unwrap();
    assert_eq!(config.server_port, 8080);
    assert_eq!(config.token_ttl_hours, 24);
    assert_eq!(config.pickup_window_minutes, 30);
    assert!(config.run_migrations);
    assert!(config.admin_bootstrap_password.is_none());
  }

  #[test]
  #[serial_test::serial]
  fn from_env_rejects_blank_secret_and_bad_ttl() {
    reset_env("  ");
    assert!(matches!(AppConfig::from_env(), Err(AppError::Config(_))));
    reset_env("s3cret");
    env::set_var("TOKEN_TTL_HOURS", "0");
    assert!(matches!(AppConfig::from_env(), Err(AppError::Config(msg)) if msg.contains("TOKEN_TTL_HOURS")));
    env::remove_var("TOKEN_TTL_HOURS");
  }

  #[test]
  #[serial_test::serial]
  fn from_env_bounds_durations() {
    reset_env("s3cret");
    env::set_var("TOKEN_TTL_HOURS", "9999999999999");
    assert!(matches!(AppConfig::from_env(), Err(AppError::Config(msg)) if msg.contains("TOKEN_TTL_HOURS")));

    reset_env("s3cret");
    env::set_var("PICKUP_WINDOW_MINUTES", "-5");
    assert!(matches!(AppConfig::from_env(), Err(AppError::Config(msg)) if msg.contains("PICKUP_WINDOW_MINUTES")));

    env::set_var("PICKUP_WINDOW_MINUTES", "1440");
    assert_eq!(AppConfig::from_env().unwrap().pickup_window_minutes, 1440);
    env::remove_var("PICKUP_WINDOW_MINUTES");
  }

  #[test]
  fn garbage_is_a_config_error() {
    let err = parse_var("SERVER_PORT", Some("eighty".to_string()), 8080u16).unwrap_err();
    assert!(matches!(err, AppError::Config(msg) if msg.contains("SERVER_PORT")));
  }
}
