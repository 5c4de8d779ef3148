// server/src/main.rs

mod config;
mod db;
mod errors;
mod models;
mod pipelines;
mod services;
mod state;
mod web;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Creates the first admin when a bootstrap password is configured and the table is empty.
async fn bootstrap_admin(pool: &PgPool, config: &AppConfig) -> Result<(), AppError> {
  let Some(password) = config.admin_bootstrap_password.as_deref() else {
    return Ok(());
  };
  if db::admins::count(pool).await? > 0 {
    tracing::debug!("Admin accounts already exist; bootstrap skipped.");
    return Ok(());
  }
  let hash = services::auth_service::hash_password(password)?;
  let admin = db::admins::insert(pool, &hash).await?;
  tracing::warn!(admin_id = admin.id, "Bootstrap admin account created.");
  Ok(())
}

async fn build_state(config: Arc<AppConfig>) -> Result<AppState, AppError> {
  let db_pool = PgPoolOptions::new()
    .max_connections(config.database_max_connections)
    .connect(&config.database_url)
    .await?;
  tracing::info!("Successfully connected to the database.");

  if config.run_migrations {
    sqlx::migrate!("./migrations")
      .run(&db_pool)
      .await
      .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))?;
    tracing::info!("Database migrations applied.");
  }
  bootstrap_admin(&db_pool, &config).await?;

  let app_state = AppState::new(db_pool, config);
  pipelines::register_all_pipelines(&app_state.pipelines)?;
  tracing::info!(count = app_state.pipelines.len(), "Pipelines registered.");
  Ok(app_state)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting Baoleme delivery server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::other(e.to_string()));
    }
  };

  let app_state = match build_state(app_config.clone()).await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to initialise application state.");
      return Err(std::io::Error::other(e.to_string()));
    }
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::services::session_registry::Principal;
  use actix_web::http::StatusCode;
  use actix_web::test;
  use baoleme_core::domain::Role;
  use serde_json::Value;

  fn lazy_state() -> AppState {
    let config = Arc::new(AppConfig::for_tests());
    let pool = PgPoolOptions::new()
      .max_connections(1)
      .connect_lazy(&config.database_url)
      .expect("lazy pool");
    AppState::new(pool, config)
  }

  #[actix_web::test]
  async fn health_answers_with_envelope() {
    let app = test::init_service(
      App::new()
        .app_data(actix_data::Data::new(lazy_state()))
        .configure(web::configure_app_routes),
    )
    .await;
    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
  }

  #[actix_web::test]
  async fn missing_token_is_unauthorized() {
    let app = test::init_service(
      App::new()
        .app_data(actix_data::Data::new(lazy_state()))
        .configure(web::configure_app_routes),
    )
    .await;
    let req = test::TestRequest::get().uri("/api/v1/user/info").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], 401);
    assert_eq!(body["message"], errors::TOKEN_INVALID);
  }

  #[actix_web::test]
  async fn admin_routes_reject_other_roles() {
    let state = lazy_state();
    let token = state.tokens.issue(7, Role::User, "alice").expect("token");
    state.sessions.open(Principal::new(Role::User, 7), &token).expect("session");
    let app = test::init_service(
      App::new()
        .app_data(actix_data::Data::new(state))
        .configure(web::configure_app_routes),
    )
    .await;
    let req = test::TestRequest::post()
      .uri("/api/v1/admin/userlist")
      .insert_header(("Authorization", format!("Bearer {}", token)))
      .set_json(serde_json::json!({ "page": 1, "page_size": 10 }))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], errors::ADMIN_ONLY);
  }

  #[actix_web::test]
  async fn revoked_session_is_unauthorized() {
    let state = lazy_state();
    let token = state.tokens.issue(3, Role::Rider, "bob").expect("token");
    let app = test::init_service(
      App::new()
        .app_data(actix_data::Data::new(state))
        .configure(web::configure_app_routes),
    )
    .await;
    let req = test::TestRequest::get()
      .uri("/api/v1/orders/rider-earnings")
      .insert_header(("Authorization", format!("Bearer {}", token)))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }
}
