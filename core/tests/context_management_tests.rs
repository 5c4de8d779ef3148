// tests/context_management_tests.rs
mod common;

use baoleme_core::{ContextData, FlowOutcome, Pipeline, StepControl};
use common::*;
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
#[serial]
async fn clones_share_the_same_state() {
  setup_tracing();
  let ctx = ContextData::new(TicketContext::default());
  let other = ctx.clone();

  other.update(|t| t.total_cents = 990);
  assert_eq!(ctx.read().total_cents, 990);
  assert_eq!(ctx.snapshot().total_cents, 990);
  assert_eq!(*ctx.map_read(|t| &t.total_cents), 990);
}

#[tokio::test]
#[serial]
async fn handlers_release_guards_before_awaiting() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, TestError>::new("ticket", &[("slow", false, None)]);
  pipeline.on("slow", |ctx: ContextData<TicketContext>| async move {
    let current = ctx.read().total_cents;
    tokio::time::sleep(Duration::from_millis(5)).await;
    // Another task can take the lock meanwhile.
    assert!(ctx.try_write().is_some());
    ctx.write().total_cents = current + 1;
    Ok::<_, TestError>(StepControl::Continue)
  });

  let ctx = ContextData::new(TicketContext::default());
  let observer = ctx.clone();
  let run = tokio::spawn(async move { pipeline.run(ctx).await });
  tokio::time::sleep(Duration::from_millis(1)).await;
  assert!(observer.try_read().is_some());

  assert_eq!(run.await.expect("task joins"), Ok(FlowOutcome::Completed));
  assert_eq!(observer.read().total_cents, 1);
}
