// server/src/services/mod.rs

pub mod auth_service;
pub mod order_locks;
pub mod session_registry;
pub mod token_service;
