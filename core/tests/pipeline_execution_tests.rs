// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use serial_test::serial;
use storefront_core::{skip_when, ContextData, Pipeline, PipelineControl, PipelineRegistry, PipelineResult};

#[tokio::test]
#[serial]
async fn test_pipeline_runs_steps_in_order() {
  setup_tracing();
  let mut pipeline =
    Pipeline::<TestContext, TestError>::new(&[("verify", false, None), ("decode", false, None), ("ack", false, None)]);

  pipeline.on_root("verify", recording_handler("verify"));
  pipeline.on_root("decode", recording_handler("decode"));
  pipeline.on_root("ack", recording_handler("ack"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["verify", "decode", "ack"]);
}

#[tokio::test]
#[serial]
async fn test_before_on_after_run_in_phase_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("reconcile", false, None)]);

  pipeline.after_root("reconcile", recording_handler("after"));
  pipeline.on_root("reconcile", recording_handler("on"));
  pipeline.before_root("reconcile", recording_handler("before"));

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().steps_executed, vec!["before", "on", "after"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_stops_on_pipeline_control_stop() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("verify", false, None),
    ("route", false, None),
    ("reconcile", false, None),
  ]);

  pipeline.on_root("verify", recording_handler("verify"));
  pipeline.on_root("route", recording_handler("route"));
  pipeline.on_root("reconcile", recording_handler("reconcile"));

  let ctx = ContextData::new(TestContext {
    should_stop_at: Some("route".to_string()),
    ..Default::default()
  });
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  assert_eq!(ctx.read().steps_executed, vec!["verify", "route"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_propagates_handler_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("good_step", false, None),
    ("bad_step", false, None),
    ("never_step", false, None),
  ]);

  pipeline.on_root("good_step", recording_handler("good_step"));
  pipeline.on_root("bad_step", |_ctx: ContextData<TestContext>| async move {
    Err::<PipelineControl, _>(TestError::Handler("signature mismatch".to_string()))
  });
  pipeline.on_root("never_step", recording_handler("never_step"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap_err(), TestError::Handler("signature mismatch".to_string()));
  assert_eq!(ctx.read().steps_executed, vec!["good_step"]);
}

#[tokio::test]
#[serial]
async fn test_missing_handler_for_required_step_is_an_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("first", false, None), ("unhandled", false, None)]);
  pipeline.on_root("first", recording_handler("first"));

  let ctx = ContextData::new(TestContext::default());
  let err = pipeline.run(ctx.clone()).await.unwrap_err();

  match err {
    TestError::Pipeline(msg) => assert!(msg.contains("unhandled"), "unexpected message: {}", msg),
    other => panic!("expected a pipeline error, got {:?}", other),
  }
  assert_eq!(ctx.read().steps_executed, vec!["first"]);
}

#[tokio::test]
#[serial]
async fn test_optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("first", false, None),
    ("audit", true, None),
    ("last", false, None),
  ]);
  pipeline.on_root("first", recording_handler("first"));
  pipeline.on_root("last", recording_handler("last"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["first", "last"]);
}

#[tokio::test]
#[serial]
async fn test_skip_condition_reads_context() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[
    ("first", false, None),
    ("audit", false, skip_when(|c: &TestContext| c.skip_audit)),
    ("last", false, None),
  ]);
  pipeline.on_root("first", recording_handler("first"));
  pipeline.on_root("audit", recording_handler("audit"));
  pipeline.on_root("last", recording_handler("last"));

  let skipped = ContextData::new(TestContext {
    skip_audit: true,
    ..Default::default()
  });
  pipeline.run(skipped.clone()).await.unwrap();
  assert_eq!(skipped.read().steps_executed, vec!["first", "last"]);

  let not_skipped = ContextData::new(TestContext::default());
  pipeline.run(not_skipped.clone()).await.unwrap();
  assert_eq!(not_skipped.read().steps_executed, vec!["first", "audit", "last"]);
}

#[tokio::test]
#[serial]
async fn test_skip_condition_sees_writes_from_earlier_steps() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("decide", false, None), ("audit", false, None)]);
  pipeline.set_skip_condition("audit", skip_when(|c: &TestContext| c.skip_audit));
  pipeline.on_root("decide", |ctx: ContextData<TestContext>| async move {
    ctx.write().skip_audit = true;
    Ok::<_, TestError>(PipelineControl::Continue)
  });
  pipeline.on_root("audit", recording_handler("audit"));

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert!(ctx.read().steps_executed.is_empty());
}

#[test]
#[should_panic(expected = "not found in pipeline definition")]
fn test_registering_handler_for_unknown_step_panics() {
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("known", false, None)]);
  pipeline.on_root("unknown", recording_handler("unknown"));
}

#[tokio::test]
#[serial]
async fn test_registry_dispatches_by_context_type() {
  setup_tracing();
  let registry = PipelineRegistry::<TestError>::new();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("only", false, None)]);
  pipeline.on_root("only", recording_handler("only"));

  assert!(!registry.is_registered::<TestContext>());
  registry.register_pipeline(pipeline);
  assert!(registry.is_registered::<TestContext>());

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(registry.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["only"]);
}

#[tokio::test]
#[serial]
async fn test_registry_reports_unregistered_context() {
  setup_tracing();
  #[derive(Default)]
  struct Unregistered;

  let registry = PipelineRegistry::<TestError>::new();
  let err = registry.run(ContextData::new(Unregistered)).await.unwrap_err();
  match err {
    TestError::Pipeline(msg) => assert!(msg.contains("NotRegistered"), "unexpected message: {}", msg),
    other => panic!("expected a pipeline error, got {:?}", other),
  }
}
