// core/src/lib.rs

//! Building blocks for the Baoleme delivery platform.
//!
//! - [`flow`]: asynchronous step pipelines used to run multi-step business
//!   operations (placing an order, grabbing it, delivering it).
//! - [`domain`]: the rules that do not need storage: order status
//!   transitions, rider availability, coupon pricing, paging and sales trends.
//! - [`validation`]: field patterns shared by request DTOs.

pub mod domain;
pub mod error;
pub mod flow;
pub mod validation;

pub use crate::error::{FlowError, FlowResult, RuleViolation};
pub use crate::flow::{
  ContextData, FlowOutcome, Handler, Pipeline, PipelineRegistry, SkipCondition, StepControl, StepDef,
};
