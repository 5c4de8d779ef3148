// server/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::order_locks::OrderLocks;
use crate::services::session_registry::SessionRegistry;
use crate::services::token_service::TokenService;
use baoleme_core::PipelineRegistry;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub pipelines: Arc<PipelineRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub tokens: Arc<TokenService>,
  pub sessions: Arc<SessionRegistry>,
  pub order_locks: Arc<OrderLocks>,
}

impl AppState {
  pub fn new(db_pool: PgPool, config: Arc<AppConfig>) -> Self {
    let ttl = chrono::Duration::hours(config.token_ttl_hours);
    Self {
      db_pool,
      pipelines: Arc::new(PipelineRegistry::new()),
      tokens: Arc::new(TokenService::new(config.jwt_secret.as_bytes(), ttl)),
      sessions: Arc::new(SessionRegistry::new(ttl)),
      order_locks: Arc::new(OrderLocks::default()),
      config,
    }
  }
}
