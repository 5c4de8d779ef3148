// core/src/flow/execution.rs

use super::context_data::ContextData;
use super::control::{FlowOutcome, StepControl};
use super::pipeline::{Phase, Pipeline};
use crate::error::FlowError;
use tracing::{event, info_span, instrument, Instrument, Level};

impl<T, E> Pipeline<T, E>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx`.
  ///
  /// Per step: evaluate `skip_if`, then run the before, on and after handlers in
  /// registration order. The first `Stop` ends the run with
  /// [`FlowOutcome::Stopped`]; the first error is returned as is.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(pipeline = %self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx: ContextData<T>) -> Result<FlowOutcome, E> {
    self.validate().map_err(E::from)?;

    for (step_index, step) in self.steps.iter().enumerate() {
      let step_name = step.name.as_str();

      if let Some(skip_if) = &step.skip_if {
        if skip_if(&ctx) {
          event!(Level::DEBUG, step_name, "Step skipped by condition.");
          continue;
        }
      }

      let hooks = match self.hooks.get(step_name).filter(|h| !h.is_empty()) {
        Some(hooks) => hooks,
        None if step.optional => {
          event!(Level::DEBUG, step_name, "Optional step has no handlers.");
          continue;
        }
        None => {
          event!(Level::ERROR, step_name, "Required step has no handlers.");
          return Err(E::from(FlowError::HandlerMissing {
            pipeline: self.name.clone(),
            step_name: step.name.clone(),
          }));
        }
      };

      let step_span = info_span!("pipeline_step", step_name, step_index);
      for phase in Phase::ALL {
        for (handler_index, handler) in hooks.phase(phase).iter().enumerate() {
          let handler_span = tracing::debug_span!(parent: &step_span, "step_handler", phase = phase.label(), handler_index);
          match handler(ctx.clone()).instrument(handler_span).await {
            Ok(StepControl::Continue) => {}
            Ok(StepControl::Stop) => {
              event!(Level::INFO, step_name, phase = phase.label(), "Pipeline stopped by handler.");
              return Ok(FlowOutcome::Stopped);
            }
            Err(err) => {
              event!(Level::WARN, step_name, phase = phase.label(), error = %err, "Step handler failed.");
              return Err(err);
            }
          }
        }
      }
    }

    event!(Level::DEBUG, "Pipeline completed.");
    Ok(FlowOutcome::Completed)
  }
}
