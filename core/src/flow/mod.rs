// core/src/flow/mod.rs

//! Asynchronous step pipelines.
//!
//! A [`Pipeline`] is an ordered list of named steps. Each step carries
//! `before`, `on` and `after` handlers that receive a clone of the shared
//! [`ContextData`] and answer with a [`StepControl`]. A [`PipelineRegistry`]
//! keeps one pipeline per context type so callers only need the context to
//! start the right flow.

pub mod context_data;
pub mod control;
pub mod execution;
pub mod pipeline;
pub mod registry;
pub mod step;

pub use context_data::ContextData;
pub use control::{FlowOutcome, StepControl};
pub use pipeline::{Handler, HandlerFuture, Phase, Pipeline};
pub use registry::PipelineRegistry;
pub use step::{SkipCondition, StepDef};
