// core/src/flow/registry.rs

//! A registry holding one pipeline per context type.
//!
//! Callers hand over a `ContextData<T>` and the registry picks the pipeline that
//! was registered for `T`. Pipelines may use their own handler error as long as
//! it converts into the registry's application error.

use super::context_data::ContextData;
use super::control::FlowOutcome;
use super::pipeline::Pipeline;
use crate::error::FlowError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, Level};

#[async_trait]
trait ErasedRunner<AppErr>: Send + Sync {
  fn pipeline_name(&self) -> &str;
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<FlowOutcome, AppErr>;
}

struct TypedRunner<T, E, AppErr>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipeline: Pipeline<T, E>,
  _app_err: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<T, E, AppErr> ErasedRunner<AppErr> for TypedRunner<T, E, AppErr>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<E> + From<FlowError> + Send + Sync + 'static,
{
  fn pipeline_name(&self) -> &str {
    self.pipeline.name()
  }

  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<FlowOutcome, AppErr> {
    let ctx = ctx.downcast::<ContextData<T>>().map_err(|_| {
      AppErr::from(FlowError::TypeMismatch {
        expected_type: type_name::<ContextData<T>>().to_string(),
      })
    })?;
    self.pipeline.run(*ctx).await.map_err(AppErr::from)
  }
}

pub struct PipelineRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  runners: RwLock<HashMap<TypeId, Arc<dyn ErasedRunner<AppErr>>>>,
}

impl<AppErr> Default for PipelineRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<AppErr> PipelineRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      runners: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `pipeline` for context type `T`.
  ///
  /// Fails if the pipeline references unknown steps or if `T` already has one.
  pub fn register<T, E>(&self, pipeline: Pipeline<T, E>) -> Result<(), FlowError>
  where
    T: Send + Sync + 'static,
    E: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<E>,
  {
    pipeline.validate()?;
    let mut runners = self.runners.write();
    if let Some(existing) = runners.get(&TypeId::of::<T>()) {
      return Err(FlowError::AlreadyRegistered {
        context_type: type_name::<T>().to_string(),
        pipeline: existing.pipeline_name().to_string(),
      });
    }
    event!(Level::DEBUG, pipeline = %pipeline.name(), context_type = %type_name::<T>(), "Registering pipeline.");
    runners.insert(
      TypeId::of::<T>(),
      Arc::new(TypedRunner::<T, E, AppErr> {
        pipeline,
        _app_err: PhantomData,
      }),
    );
    Ok(())
  }

  pub fn is_registered<T: Send + Sync + 'static>(&self) -> bool {
    self.runners.read().contains_key(&TypeId::of::<T>())
  }

  pub fn len(&self) -> usize {
    self.runners.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Runs the pipeline registered for `T`.
  pub async fn run<T>(&self, ctx: ContextData<T>) -> Result<FlowOutcome, AppErr>
  where
    T: Send + Sync + 'static,
  {
    let runner = self.runners.read().get(&TypeId::of::<T>()).cloned();
    let runner = runner.ok_or_else(|| {
      event!(Level::ERROR, context_type = %type_name::<T>(), "No pipeline registered.");
      AppErr::from(FlowError::NotRegistered {
        context_type: type_name::<T>().to_string(),
      })
    })?;
    runner.run_erased(Box::new(ctx)).await
  }
}
