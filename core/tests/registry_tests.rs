// tests/registry_tests.rs
mod common;

use baoleme_core::{ContextData, FlowError, FlowOutcome, Pipeline, PipelineRegistry, StepControl};
use common::*;
use serial_test::serial;

fn dispatch_pipeline(order_id: i64) -> Pipeline<DispatchContext, TestError> {
  let mut pipeline = Pipeline::<DispatchContext, TestError>::new("dispatch", &[("assign", false, None)]);
  pipeline.on("assign", move |ctx: ContextData<DispatchContext>| async move {
    ctx.write().assigned_order = Some(order_id);
    Ok::<_, TestError>(StepControl::Continue)
  });
  pipeline
}

#[tokio::test]
#[serial]
async fn runs_the_pipeline_registered_for_the_context_type() {
  setup_tracing();
  let registry = PipelineRegistry::<TestError>::new();

  let mut ticket = Pipeline::<TicketContext, TestError>::new("ticket", &[("price", false, None)]);
  ticket.on("price", recording_handler("price", 250));
  registry.register(ticket).expect("ticket registers");
  registry.register(dispatch_pipeline(42)).expect("dispatch registers");
  assert_eq!(registry.len(), 2);

  let ticket_ctx = ContextData::new(TicketContext::default());
  assert_eq!(registry.run(ticket_ctx.clone()).await, Ok(FlowOutcome::Completed));
  assert_eq!(ticket_ctx.read().total_cents, 250);

  let dispatch_ctx = ContextData::new(DispatchContext {
    rider_id: 9,
    ..Default::default()
  });
  assert_eq!(registry.run(dispatch_ctx.clone()).await, Ok(FlowOutcome::Completed));
  assert_eq!(dispatch_ctx.read().assigned_order, Some(42));
}

#[tokio::test]
#[serial]
async fn unregistered_context_type_is_an_error() {
  setup_tracing();
  let registry = PipelineRegistry::<TestError>::new();
  assert!(registry.is_empty());

  let outcome = registry.run(ContextData::new(DispatchContext::default())).await;
  match outcome {
    Err(TestError::Flow(msg)) => assert!(msg.contains("DispatchContext"), "unexpected message: {msg}"),
    other => panic!("expected NotRegistered, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn second_pipeline_for_same_context_is_refused() {
  setup_tracing();
  let registry = PipelineRegistry::<TestError>::new();
  registry.register(dispatch_pipeline(1)).expect("first registers");

  let err = registry.register(dispatch_pipeline(2)).expect_err("duplicate refused");
  assert!(matches!(err, FlowError::AlreadyRegistered { .. }));
  assert!(registry.is_registered::<DispatchContext>());
}

#[tokio::test]
#[serial]
async fn pipeline_with_dangling_handler_cannot_register() {
  setup_tracing();
  let registry = PipelineRegistry::<TestError>::new();
  let mut pipeline = Pipeline::<TicketContext, TestError>::new("ticket", &[("price", false, None)]);
  pipeline.on("prise", recording_handler("typo", 0));

  assert!(matches!(registry.register(pipeline), Err(FlowError::StepNotFound { .. })));
  assert!(!registry.is_registered::<TicketContext>());
}

#[tokio::test]
#[serial]
async fn handler_errors_surface_through_the_registry() {
  setup_tracing();
  let registry = PipelineRegistry::<TestError>::new();
  let mut pipeline = Pipeline::<TicketContext, TestError>::new("ticket", &[("price", false, None)]);
  pipeline.on("price", failing_handler("price", "coupon expired"));
  registry.register(pipeline).expect("registers");

  let outcome = registry.run(ContextData::new(TicketContext::default())).await;
  assert_eq!(outcome, Err(TestError::Handler("coupon expired".to_string())));
}
