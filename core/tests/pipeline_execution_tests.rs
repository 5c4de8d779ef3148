// tests/pipeline_execution_tests.rs
mod common;

use baoleme_core::{ContextData, FlowOutcome, Pipeline, SkipCondition, StepControl, StepDef};
use common::*;
use serial_test::serial;
use std::sync::Arc;

fn three_step_pipeline() -> Pipeline<TicketContext, TestError> {
  Pipeline::new(
    "ticket",
    &[("open", false, None), ("price", false, None), ("close", false, None)],
  )
}

#[tokio::test]
#[serial]
async fn steps_run_in_declaration_order() {
  setup_tracing();
  let mut pipeline = three_step_pipeline();
  pipeline.on("close", recording_handler("close", 1));
  pipeline.on("open", recording_handler("open", 10));
  pipeline.on("price", recording_handler("price", 100));

  let ctx = ContextData::new(TicketContext::default());
  let outcome = pipeline.run(ctx.clone()).await;

  assert_eq!(outcome, Ok(FlowOutcome::Completed));
  let guard = ctx.read();
  assert_eq!(guard.trail, vec!["open", "price", "close"]);
  assert_eq!(guard.total_cents, 111);
}

#[tokio::test]
#[serial]
async fn stop_halts_the_remaining_steps() {
  setup_tracing();
  let mut pipeline = three_step_pipeline();
  pipeline
    .on("open", recording_handler("open", 1))
    .on("price", recording_handler("price", 2))
    .on("close", recording_handler("close", 4));

  let ctx = ContextData::new(TicketContext {
    stop_at: Some("price".to_string()),
    ..Default::default()
  });
  let outcome = pipeline.run(ctx.clone()).await;

  assert_eq!(outcome, Ok(FlowOutcome::Stopped));
  assert_eq!(ctx.read().trail, vec!["open", "price"]);
  assert_eq!(ctx.read().total_cents, 3);
}

#[tokio::test]
#[serial]
async fn first_error_is_returned_unchanged() {
  setup_tracing();
  let mut pipeline = three_step_pipeline();
  pipeline
    .on("open", recording_handler("open", 1))
    .on("price", failing_handler("price", "out of stock"))
    .on("close", recording_handler("close", 1));

  let ctx = ContextData::new(TicketContext::default());
  let outcome = pipeline.run(ctx.clone()).await;

  assert_eq!(outcome, Err(TestError::Handler("out of stock".to_string())));
  assert_eq!(ctx.read().trail, vec!["open", "price"]);
}

#[tokio::test]
#[serial]
async fn skip_condition_is_checked_against_live_context() {
  setup_tracing();
  let already_big: SkipCondition<TicketContext> = Arc::new(|ctx| ctx.read().total_cents >= 50);
  let mut pipeline = Pipeline::<TicketContext, TestError>::new(
    "ticket",
    &[("open", false, None), ("free_gift", false, Some(already_big)), ("close", false, None)],
  );
  pipeline
    .on("open", recording_handler("open", 60))
    .on("free_gift", recording_handler("free_gift", 0))
    .on("close", recording_handler("close", 0));

  let ctx = ContextData::new(TicketContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(FlowOutcome::Completed));
  assert_eq!(ctx.read().trail, vec!["open", "close"]);
}

#[tokio::test]
#[serial]
async fn required_step_without_handlers_fails() {
  setup_tracing();
  let mut pipeline = three_step_pipeline();
  pipeline.on("open", recording_handler("open", 0));
  pipeline.on("close", recording_handler("close", 0));

  let outcome = pipeline.run(ContextData::new(TicketContext::default())).await;

  match outcome {
    Err(TestError::Flow(msg)) => assert!(msg.contains("'price'"), "unexpected message: {msg}"),
    other => panic!("expected a missing-handler error, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, TestError>::from_steps(
    "ticket",
    vec![StepDef::required("open"), StepDef::optional("notify")],
  );
  pipeline.on("open", recording_handler("open", 0));

  let ctx = ContextData::new(TicketContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(FlowOutcome::Completed));
  assert_eq!(ctx.read().trail, vec!["open"]);
}

#[tokio::test]
#[serial]
async fn before_on_after_run_in_phase_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, TestError>::new("ticket", &[("price", false, None)]);
  pipeline
    .after("price", recording_handler("after", 0))
    .on("price", recording_handler("on", 0))
    .before("price", recording_handler("before", 0))
    .on("price", recording_handler("on_again", 0));

  let ctx = ContextData::new(TicketContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(FlowOutcome::Completed));
  assert_eq!(ctx.read().trail, vec!["before", "on", "on_again", "after"]);
}

#[tokio::test]
#[serial]
async fn handler_on_unknown_step_is_reported_at_run() {
  setup_tracing();
  let mut pipeline = three_step_pipeline();
  pipeline.on("opne", recording_handler("typo", 0));

  assert!(pipeline.validate().is_err());
  let outcome = pipeline.run(ContextData::new(TicketContext::default())).await;
  assert!(matches!(outcome, Err(TestError::Flow(msg)) if msg.contains("opne")));
}

#[tokio::test]
#[serial]
async fn steps_can_be_inserted_and_removed() {
  setup_tracing();
  let mut pipeline = three_step_pipeline();
  pipeline
    .insert_before("price", StepDef::required("load"))
    .expect("price exists");
  pipeline
    .insert_after("price", StepDef::optional("audit"))
    .expect("price exists");
  assert!(pipeline.insert_after("missing", StepDef::required("x")).is_err());
  assert!(pipeline.insert_before("open", StepDef::required("close")).is_err());

  assert!(pipeline.remove_step("close"));
  assert!(!pipeline.remove_step("close"));
  assert_eq!(pipeline.step_names(), vec!["open", "load", "price", "audit"]);

  pipeline
    .on("open", recording_handler("open", 0))
    .on("load", recording_handler("load", 0))
    .on("price", |ctx: ContextData<TicketContext>| async move {
      ctx.write().trail.push("price".to_string());
      Ok::<_, TestError>(StepControl::Continue)
    });

  let ctx = ContextData::new(TicketContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await, Ok(FlowOutcome::Completed));
  assert_eq!(ctx.read().trail, vec!["open", "load", "price"]);
}
