//! Integration tests for control-flow signals.
//!
//! Tests verify that:
//! - Skip ends one cog and nothing else
//! - Fail is absorbed unless abort-on-failure is configured
//! - Next ends the scope quietly
//! - Break ends the scope, settles the final output, and propagates
//! - Panics surface as typed errors

mod common;

use cogflow_core::config::{ConfigResolver, ConfigScope};
use cogflow_core::signal::SignalKind;
use cogflow_core::value::Value;
use cogflow_engine::plan::{no_input, outputs_fn, value_input, ScopePlan};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{fixture_kinds, fixture_manager, fixture_manager_with_resolver, init_tracing};

#[tokio::test]
async fn skip_ends_one_cog_and_nothing_else() {
    init_tracing();
    let (kinds, _) = fixture_kinds();
    let mut manager = fixture_manager(kinds);
    manager
        .prepare(
            ScopePlan::new()
                .named_cog("skipper", "optional", no_input())
                .named_cog("echo", "work", value_input(Value::int(9))),
        )
        .unwrap();

    let output = manager.run().await.unwrap();
    assert_eq!(output.as_i64(), Some(9));

    let accessor = manager.output_accessor().unwrap().clone();
    assert_eq!(accessor.get("optional").await.unwrap_err().code(), "E203");
}

#[tokio::test]
async fn fail_is_absorbed_by_default() {
    init_tracing();
    let (kinds, _) = fixture_kinds();
    let mut manager = fixture_manager(kinds);
    manager
        .prepare(
            ScopePlan::new()
                .named_cog("failer", "flaky", no_input())
                .named_cog("echo", "work", value_input(Value::int(1))),
        )
        .unwrap();

    let output = manager.run().await.unwrap();
    assert_eq!(output.as_i64(), Some(1));
}

#[tokio::test]
async fn abort_on_failure_reraises_fail_and_stops_the_scope() {
    init_tracing();
    let (kinds, _) = fixture_kinds();
    let mut resolver = ConfigResolver::new();
    resolver
        .register(
            "failer",
            ConfigScope::Named("flaky".to_string()),
            Value(json!({"abort_on_failure": true})),
        )
        .unwrap();

    let mut manager = fixture_manager_with_resolver(kinds, Arc::new(resolver));
    manager
        .prepare(
            ScopePlan::new()
                .named_cog("failer", "flaky", no_input())
                .named_cog("slow", "late", no_input()),
        )
        .unwrap();

    let err = manager.run().await.unwrap_err();
    assert_eq!(err.as_signal().unwrap().kind, SignalKind::Fail);

    let accessor = manager.output_accessor().unwrap().clone();
    let late = accessor.get("late").await.unwrap_err();
    assert!(matches!(late.code(), "E205" | "E202"));
}

#[tokio::test]
async fn next_from_a_synchronous_cog_prevents_later_starts() {
    init_tracing();
    let (kinds, _) = fixture_kinds();
    let mut resolver = ConfigResolver::new();
    resolver
        .register(
            "nexter",
            ConfigScope::Named("gate".to_string()),
            Value(json!({"synchronous": true})),
        )
        .unwrap();

    let mut manager = fixture_manager_with_resolver(kinds, Arc::new(resolver));
    manager
        .prepare(
            ScopePlan::new()
                .named_cog("nexter", "gate", no_input())
                .named_cog("echo", "after", value_input(Value::int(1))),
        )
        .unwrap();

    // Next ends the scope quietly.
    let output = manager.run().await.unwrap();
    assert!(output.is_null());

    let accessor = manager.output_accessor().unwrap().clone();
    // The signalling cog itself ended without an output.
    assert_eq!(accessor.get("gate").await.unwrap_err().code(), "E203");
    // The cog declared after it was never started.
    assert_eq!(accessor.get("after").await.unwrap_err().code(), "E202");
}

#[tokio::test]
async fn next_from_a_concurrent_cog_cancels_in_flight_siblings() {
    init_tracing();
    let (kinds, _) = fixture_kinds();
    let mut manager = fixture_manager(kinds);
    manager
        .prepare(
            ScopePlan::new()
                .named_cog("nexter", "gate", no_input())
                .named_cog("slow", "late", no_input()),
        )
        .unwrap();

    let output = manager.run().await.unwrap();
    assert!(output.is_null());

    let accessor = manager.output_accessor().unwrap().clone();
    let late = accessor.get("late").await.unwrap_err();
    assert!(matches!(late.code(), "E205" | "E202"));
}

#[tokio::test]
async fn break_propagates_but_still_settles_the_final_output() {
    init_tracing();
    let (kinds, _) = fixture_kinds();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in_block = Arc::clone(&calls);

    // "work" is synchronous so it has settled before the breaker starts.
    let mut resolver = ConfigResolver::new();
    resolver
        .register(
            "echo",
            ConfigScope::Named("work".to_string()),
            Value(json!({"synchronous": true})),
        )
        .unwrap();

    let mut manager = fixture_manager_with_resolver(kinds, Arc::new(resolver));
    manager
        .prepare(
            ScopePlan::new()
                .named_cog("echo", "work", value_input(Value::int(21)))
                .named_cog("breaker", "gate", no_input())
                .outputs(outputs_fn(move |outputs, _scope, _idx| {
                    let calls = Arc::clone(&calls_in_block);
                    Box::pin(async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        let doubled = outputs.get_or_nil("work").await?.as_i64().unwrap_or(0) * 2;
                        Ok(Value::int(doubled))
                    })
                })),
        )
        .unwrap();

    let err = manager.run().await.unwrap_err();
    assert_eq!(err.as_signal().unwrap().kind, SignalKind::Break);

    // The final output was settled exactly once, on the break path.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(manager.final_output().unwrap().as_i64(), Some(42));
}

#[tokio::test]
async fn panic_surfaces_as_a_typed_error() {
    init_tracing();
    let (kinds, _) = fixture_kinds();
    let mut manager = fixture_manager(kinds);
    manager
        .prepare(ScopePlan::new().named_cog("panicking", "bad", no_input()))
        .unwrap();

    let err = manager.run().await.unwrap_err();
    assert_eq!(err.code(), "E303");
}

#[tokio::test]
async fn lenient_outputs_absorb_skip_raised_inside_the_block() {
    init_tracing();
    let (kinds, _) = fixture_kinds();
    let mut manager = fixture_manager(kinds);
    manager
        .prepare(
            ScopePlan::new()
                .named_cog("echo", "work", value_input(Value::int(1)))
                .outputs(outputs_fn(|_outputs, _scope, _idx| {
                    Box::pin(async {
                        Err(cogflow_core::signal::FlowSignal::skip().into())
                    })
                })),
        )
        .unwrap();

    let output = manager.run().await.unwrap();
    assert!(output.is_null());
}

#[tokio::test]
async fn lenient_outputs_never_absorb_fail() {
    init_tracing();
    let (kinds, _) = fixture_kinds();
    let mut manager = fixture_manager(kinds);
    manager
        .prepare(
            ScopePlan::new()
                .named_cog("echo", "work", value_input(Value::int(1)))
                .outputs(outputs_fn(|_outputs, _scope, _idx| {
                    Box::pin(async {
                        Err(cogflow_core::signal::FlowSignal::fail()
                            .with_message("bad data")
                            .into())
                    })
                })),
        )
        .unwrap();

    let err = manager.run().await.unwrap_err();
    assert_eq!(err.as_signal().unwrap().kind, SignalKind::Fail);
}
