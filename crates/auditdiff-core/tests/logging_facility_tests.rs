//! Lifecycle logging emitted by the diff orchestrators.
//!
//! A single capture subscriber is installed per test binary, so every test
//! narrows the captured events to its own diff id.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use auditdiff_core::auditdiff_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_ERR_CODE, FIELD_FQDN, FIELD_RECORD_COUNT,
};
use auditdiff_core::auditdiff_core_types::{DiffContext, DiffId};
use auditdiff_core::errors::AuditDiffError;
use auditdiff_core::logging_facility::test_capture::init_test_capture;
use auditdiff_core::{log_op_end, log_op_error, log_op_start};
use auditdiff_core::{ConcurrentDiffer, DiffConfig, Differ, Value};
use serde_json::json;

fn overflowing_config() -> DiffConfig {
    DiffConfig::default()
        .with_ignored_collection_order(["id"])
        .with_max_elements(1)
}

#[test]
fn test_start_macro_tags_diff_id() {
    let capture = init_test_capture();
    let diff_id = DiffId::new();

    log_op_start!("macro_start", &diff_id, subject = "order:1");

    let events = capture.lifecycle(&diff_id);
    assert_eq!(events.len(), 1);
    assert!(events[0].is("macro_start", EVENT_START));
    assert_eq!(events[0].field("subject"), Some("order:1"));
}

#[test]
fn test_end_macro_records_duration() {
    let capture = init_test_capture();
    let diff_id = DiffId::new();

    log_op_end!("macro_end", &diff_id, duration_ms = 42u64);

    let events = capture.lifecycle(&diff_id);
    assert_eq!(events.len(), 1, "Should have exactly one end event");
    assert!(events[0].is("macro_end", EVENT_END));
    assert_eq!(events[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_error_macro_carries_code_and_path() {
    let capture = init_test_capture();
    let diff_id = DiffId::new();

    let err = AuditDiffError::BucketCapacityExceeded {
        fqdn: "tags[]".to_string(),
        len: 3,
        capacity: 2,
    };
    log_op_error!("macro_error", &diff_id, err, duration_ms = 10u64);

    let events = capture.lifecycle(&diff_id);
    let error_event = events
        .iter()
        .find(|e| e.is("macro_error", EVENT_END_ERROR))
        .expect("error event");
    assert_eq!(error_event.field(FIELD_ERR_CODE), Some("ERR_CAPACITY_EXCEEDED"));
    assert_eq!(error_event.field(FIELD_FQDN), Some("tags[]"));
    assert!(error_event
        .field("error")
        .unwrap()
        .contains(diff_id.as_str()));
}

#[test]
fn test_diff_emits_start_and_end() {
    let capture = init_test_capture();
    let ctx = DiffContext::new().with_subject("customer:42");

    let before = Value::from(json!({"age": 30}));
    let after = Value::from(json!({"age": 31}));
    Differ::default()
        .diff_with_context(Some(&before), Some(&after), &ctx)
        .unwrap();

    let events = capture.lifecycle(&ctx.diff_id);
    assert_eq!(events.len(), 2);
    assert!(events[0].is("diff", EVENT_START));
    assert_eq!(events[0].field("subject"), Some("customer:42"));
    assert!(events[1].is("diff", EVENT_END));
    assert_eq!(events[1].field(FIELD_RECORD_COUNT), Some("1"));
    assert!(events[1].field("duration_ms").is_some());
}

#[test]
fn test_failed_diff_emits_end_error() {
    let capture = init_test_capture();
    let ctx = DiffContext::new();

    let before = Value::from(json!({"tags": ["a", "b"]}));
    let after = Value::from(json!({"tags": ["c"]}));
    let result = Differ::new(overflowing_config())
        .unwrap()
        .diff_with_context(Some(&before), Some(&after), &ctx);
    assert!(result.is_err());

    let events = capture.lifecycle(&ctx.diff_id);
    assert_eq!(
        events.iter().filter(|e| e.is("diff", EVENT_END_ERROR)).count(),
        1
    );
    assert!(!events.iter().any(|e| e.is("diff", EVENT_END)));
}

#[tokio::test]
async fn test_concurrent_failure_is_logged_once() {
    let capture = init_test_capture();
    let ctx = DiffContext::new();

    let differ = ConcurrentDiffer::new(overflowing_config()).unwrap();
    let result = differ
        .diff_with_context(
            Some(Value::from(json!(["a", "b"]))),
            Some(Value::from(json!(["c"]))),
            &ctx,
        )
        .await;
    assert!(result.is_err());

    let errors = capture.count_events(|e| {
        e.is("diff_concurrent", EVENT_END_ERROR) && e.diff_id() == Some(ctx.diff_id.as_str())
    });
    assert_eq!(errors, 1);
    capture.assert_event_exists("diff_concurrent", EVENT_START);
}
