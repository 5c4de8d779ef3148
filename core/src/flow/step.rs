// core/src/flow/step.rs

use super::ContextData;
use std::sync::Arc;

/// Predicate evaluated right before a step; `true` skips it.
pub type SkipCondition<T> = Arc<dyn Fn(&ContextData<T>) -> bool + Send + Sync + 'static>;

#[derive(Clone)]
pub struct StepDef<T: Send + Sync + 'static> {
  pub name: String,
  /// An optional step with no handlers is skipped instead of failing the run.
  pub optional: bool,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: Send + Sync + 'static> StepDef<T> {
  pub fn required(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      optional: false,
      skip_if: None,
    }
  }

  pub fn optional(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      optional: true,
      skip_if: None,
    }
  }

  pub fn skip_when(mut self, cond: impl Fn(&ContextData<T>) -> bool + Send + Sync + 'static) -> Self {
    self.skip_if = Some(Arc::new(cond));
    self
  }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("has_skip_condition", &self.skip_if.is_some())
      .finish()
  }
}
