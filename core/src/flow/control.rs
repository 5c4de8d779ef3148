// core/src/flow/control.rs

//! Signals handlers return and the overall result of a run.

/// Returned by every handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  /// Keep going with the remaining handlers and steps.
  Continue,
  /// Halt the whole run right here. Nothing after this handler executes.
  Stop,
}

/// How a run ended when no handler failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
  Completed,
  Stopped,
}

impl FlowOutcome {
  pub fn is_completed(self) -> bool {
    matches!(self, FlowOutcome::Completed)
  }
}
