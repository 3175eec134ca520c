#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use chrono::Utc;
use common::{add_cmd, rest_meta, seeded_store};
use servertag_core::errors::ServerTagError;
use servertag_core::logging_facility::test_capture::init_test_capture;
use servertag_core::ops::host_ops;
use servertag_core::servertag_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_DIFF_COUNT, FIELD_DURATION_MS, FIELD_ERR_CODE,
    FIELD_ERR_KIND, FIELD_HOST_COUNT, FIELD_REQUEST_ID,
};
use servertag_core::servertag_core_types::RequestId;
use servertag_core::{apply, log_op_end, log_op_error, log_op_start, ChangeLog, OnMissing};

#[test]
fn test_log_op_end_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_1";

    log_op_start!(op_name, host_name = "cleon");
    log_op_end!(op_name, duration_ms = 42);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_START));
    assert_eq!(events[0].field("host_name"), Some("cleon"));
    assert_eq!(events[1].event.as_deref(), Some(EVENT_END));
    assert_eq!(events[1].field(FIELD_DURATION_MS), Some("42"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_2";

    let err = ServerTagError::HostNotFound {
        name: "cleon".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END_ERROR));
    assert_eq!(events[0].field(FIELD_ERR_CODE), Some("ERR_NOT_FOUND"));
    assert_eq!(events[0].field(FIELD_ERR_KIND), Some("NotFound"));
    assert_eq!(events[0].level, tracing::Level::ERROR);
}

#[test]
fn test_apply_logs_boundaries_with_request_id() {
    let capture = init_test_capture();
    let mut store = seeded_store(&[]);
    let meta = rest_meta().with_request_id(RequestId::from("req-logging-apply"));

    apply(&mut store, &add_cmd(&["logged"], &["foo"]), &meta, Utc::now()).unwrap();

    let ours: Vec<_> = capture
        .events_for_op("apply")
        .into_iter()
        .filter(|e| e.field(FIELD_REQUEST_ID) == Some("req-logging-apply"))
        .collect();
    assert_eq!(ours.len(), 2);
    assert_eq!(ours[0].event.as_deref(), Some(EVENT_START));
    assert_eq!(ours[0].field("command"), Some("add_tags"));
    assert_eq!(ours[1].event.as_deref(), Some(EVENT_END));
    assert_eq!(ours[1].field(FIELD_DIFF_COUNT), Some("2"));
    assert!(ours[1].field(FIELD_DURATION_MS).is_some());
}

#[test]
fn test_workflow_failure_logs_end_error() {
    let capture = init_test_capture();
    let mut store = seeded_store(&[]);
    let mut log = ChangeLog::new();

    let result = host_ops::delete_host(&mut store, "unlogged-ghost", &mut log);
    assert!(result.is_err());

    let count = capture.count_events(|e| {
        e.op.as_deref() == Some("delete_host")
            && e.event.as_deref() == Some(EVENT_END_ERROR)
            && e.field(FIELD_ERR_CODE) == Some("ERR_NOT_FOUND")
    });
    assert!(count >= 1);
    capture.assert_event_exists("delete_host", EVENT_START);
}

#[test]
fn test_add_tags_end_reports_host_count() {
    let capture = init_test_capture();
    let mut store = seeded_store(&[]);
    let mut log = ChangeLog::new();

    host_ops::add_tags(
        &mut store,
        &["counted-a", "counted-b"],
        &["foo"],
        OnMissing::New,
        &mut log,
    )
    .unwrap();

    let count = capture.count_events(|e| {
        e.op.as_deref() == Some("add_tags")
            && e.event.as_deref() == Some(EVENT_END)
            && e.field(FIELD_HOST_COUNT) == Some("2")
    });
    assert!(count >= 1);
}
