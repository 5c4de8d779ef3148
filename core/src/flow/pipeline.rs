// core/src/flow/pipeline.rs

//! Pipeline definition: the ordered step list and the handlers hooked onto it.

use super::context_data::ContextData;
use super::control::StepControl;
use super::step::{SkipCondition, StepDef};
use crate::error::FlowError;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tracing::{event, Level};

pub type HandlerFuture<E> = Pin<Box<dyn Future<Output = Result<StepControl, E>> + Send + 'static>>;

/// A type-erased step handler. Each invocation gets its own clone of the context.
pub type Handler<T, E> = Box<dyn Fn(ContextData<T>) -> HandlerFuture<E> + Send + Sync + 'static>;

/// Which slot of a step a handler runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
  Before,
  On,
  After,
}

impl Phase {
  pub(crate) const ALL: [Phase; 3] = [Phase::Before, Phase::On, Phase::After];

  pub(crate) fn label(self) -> &'static str {
    match self {
      Phase::Before => "before",
      Phase::On => "on",
      Phase::After => "after",
    }
  }
}

pub(crate) struct StepHooks<T: Send + Sync + 'static, E> {
  pub(crate) before: Vec<Handler<T, E>>,
  pub(crate) on: Vec<Handler<T, E>>,
  pub(crate) after: Vec<Handler<T, E>>,
}

impl<T: Send + Sync + 'static, E> Default for StepHooks<T, E> {
  fn default() -> Self {
    Self {
      before: Vec::new(),
      on: Vec::new(),
      after: Vec::new(),
    }
  }
}

impl<T: Send + Sync + 'static, E> StepHooks<T, E> {
  pub(crate) fn phase(&self, phase: Phase) -> &[Handler<T, E>] {
    match phase {
      Phase::Before => &self.before,
      Phase::On => &self.on,
      Phase::After => &self.after,
    }
  }

  fn phase_mut(&mut self, phase: Phase) -> &mut Vec<Handler<T, E>> {
    match phase {
      Phase::Before => &mut self.before,
      Phase::On => &mut self.on,
      Phase::After => &mut self.after,
    }
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.before.is_empty() && self.on.is_empty() && self.after.is_empty()
  }
}

/// A named sequence of steps run against `ContextData<T>`.
///
/// `E` is the error every handler ultimately returns. It must absorb
/// [`FlowError`] so engine failures (like a required step with no handler)
/// surface through the same channel.
pub struct Pipeline<T, E>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<T>>,
  pub(crate) hooks: HashMap<String, StepHooks<T, E>>,
  /// Handlers registered against names that are not steps. Reported by `validate`.
  pub(crate) dangling: Vec<String>,
}

impl<T, E> Pipeline<T, E>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Builds a pipeline from `(step_name, optional, skip_if)` triples.
  pub fn new(name: impl Into<String>, step_defs: &[(&str, bool, Option<SkipCondition<T>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(step_name, optional, skip_if)| StepDef {
        name: (*step_name).to_string(),
        optional: *optional,
        skip_if: skip_if.clone(),
      })
      .collect();
    Self::from_steps(name, steps)
  }

  pub fn from_steps(name: impl Into<String>, steps: Vec<StepDef<T>>) -> Self {
    Self {
      name: name.into(),
      steps,
      hooks: HashMap::new(),
      dangling: Vec::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  fn position(&self, step_name: &str) -> Option<usize> {
    self.steps.iter().position(|s| s.name == step_name)
  }

  /// Fails if any handler was attached to an unknown step.
  pub fn validate(&self) -> Result<(), FlowError> {
    match self.dangling.first() {
      Some(step_name) => Err(FlowError::StepNotFound {
        pipeline: self.name.clone(),
        step_name: step_name.clone(),
      }),
      None => Ok(()),
    }
  }

  fn insert_at(&mut self, idx: usize, step: StepDef<T>) -> Result<(), FlowError> {
    if self.position(&step.name).is_some() {
      return Err(FlowError::DuplicateStep {
        pipeline: self.name.clone(),
        step_name: step.name,
      });
    }
    self.steps.insert(idx, step);
    Ok(())
  }

  pub fn insert_before(&mut self, existing: &str, step: StepDef<T>) -> Result<(), FlowError> {
    let idx = self.position(existing).ok_or_else(|| FlowError::StepNotFound {
      pipeline: self.name.clone(),
      step_name: existing.to_string(),
    })?;
    self.insert_at(idx, step)
  }

  pub fn insert_after(&mut self, existing: &str, step: StepDef<T>) -> Result<(), FlowError> {
    let idx = self.position(existing).ok_or_else(|| FlowError::StepNotFound {
      pipeline: self.name.clone(),
      step_name: existing.to_string(),
    })?;
    self.insert_at(idx + 1, step)
  }

  /// Removes a step and all its handlers. Returns whether it existed.
  pub fn remove_step(&mut self, step_name: &str) -> bool {
    match self.position(step_name) {
      Some(idx) => {
        self.steps.remove(idx);
        self.hooks.remove(step_name);
        true
      }
      None => false,
    }
  }

  pub fn set_skip_condition(&mut self, step_name: &str, skip_if: Option<SkipCondition<T>>) -> Result<(), FlowError> {
    let pipeline = self.name.clone();
    let step = self
      .steps
      .iter_mut()
      .find(|s| s.name == step_name)
      .ok_or_else(|| FlowError::StepNotFound {
        pipeline,
        step_name: step_name.to_string(),
      })?;
    step.skip_if = skip_if;
    Ok(())
  }

  fn attach<F, Fut, UserErr>(&mut self, phase: Phase, step_name: &str, handler_fn: F) -> &mut Self
  where
    F: Fn(ContextData<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
    UserErr: Into<E> + 'static,
  {
    if self.position(step_name).is_none() {
      event!(Level::WARN, pipeline = %self.name, step_name, "Handler attached to unknown step.");
      self.dangling.push(step_name.to_string());
      return self;
    }
    let handler: Handler<T, E> = Box::new(move |ctx| {
      let fut = handler_fn(ctx);
      Box::pin(async move { fut.await.map_err(Into::into) })
    });
    self
      .hooks
      .entry(step_name.to_string())
      .or_default()
      .phase_mut(phase)
      .push(handler);
    self
  }

  pub fn before<F, Fut, UserErr>(&mut self, step_name: &str, handler_fn: F) -> &mut Self
  where
    F: Fn(ContextData<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
    UserErr: Into<E> + 'static,
  {
    self.attach(Phase::Before, step_name, handler_fn)
  }

  pub fn on<F, Fut, UserErr>(&mut self, step_name: &str, handler_fn: F) -> &mut Self
  where
    F: Fn(ContextData<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
    UserErr: Into<E> + 'static,
  {
    self.attach(Phase::On, step_name, handler_fn)
  }

  pub fn after<F, Fut, UserErr>(&mut self, step_name: &str, handler_fn: F) -> &mut Self
  where
    F: Fn(ContextData<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
    UserErr: Into<E> + 'static,
  {
    self.attach(Phase::After, step_name, handler_fn)
  }
}
