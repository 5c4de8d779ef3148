// server/src/pipelines/mod.rs

//! Multi-step business operations, each registered as a pipeline keyed by its context type.

use crate::errors::AppError;
use baoleme_core::PipelineRegistry;

pub mod common_steps;
pub mod contexts;

pub mod auto_dispatch_pipeline;
pub mod cart_pipeline;
pub mod delivery_progress_pipeline;
pub mod grab_order_pipeline;
pub mod place_order_pipeline;
pub mod signin_pipeline;
pub mod signup_pipeline;

/// Registers every pipeline once at startup.
pub fn register_all_pipelines(registry: &PipelineRegistry<AppError>) -> Result<(), AppError> {
  tracing::info!("Registering pipelines...");

  signup_pipeline::register_signup_pipeline(registry)?;
  signin_pipeline::register_signin_pipeline(registry)?;
  cart_pipeline::register_add_to_cart_pipeline(registry)?;
  place_order_pipeline::register_place_order_pipeline(registry)?;
  grab_order_pipeline::register_grab_order_pipeline(registry)?;
  auto_dispatch_pipeline::register_auto_dispatch_pipeline(registry)?;
  delivery_progress_pipeline::register_delivery_progress_pipeline(registry)?;

  tracing::info!(count = registry.len(), "All pipelines registered.");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_pipeline_registers_once() {
    let registry = PipelineRegistry::<AppError>::new();
    register_all_pipelines(&registry).expect("registration succeeds");
    assert_eq!(registry.len(), 7);
    assert!(register_all_pipelines(&registry).is_err());
  }
}
