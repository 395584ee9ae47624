// crates/autonomy-kernel-core/tests/audit.rs
// ============================================================================
// Module: Audit Sink Tests
// Description: JSON-lines audit output and in-memory capture.
// ============================================================================
//! ## Overview
//! Ensures file-backed audit sinks append one JSON object per line and
//! in-memory sinks filter by action.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::fs;

use autonomy_kernel_core::AuditEvent;
use autonomy_kernel_core::AuditSink;
use autonomy_kernel_core::runtime::FileAuditSink;
use autonomy_kernel_core::runtime::InMemoryAuditSink;
use serde_json::json;

use crate::common::epoch;

#[test]
fn file_sink_appends_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    {
        let sink = FileAuditSink::new(&path).unwrap();
        sink.append(&AuditEvent::new(epoch(), "executor", "execute_effect", json!({"n": 1}))).unwrap();
        sink.append(&AuditEvent::new(epoch(), "executor", "metering_error", json!({"n": 2}))).unwrap();
    }
    let sink = FileAuditSink::new(&path).unwrap();
    sink.append(&AuditEvent::new(epoch(), "gate", "bind", json!({"n": 3}))).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let events: Vec<AuditEvent> =
        contents.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].event, AuditEvent::KERNEL_EVENT);
    assert_eq!(events[2].action, "bind");
    assert_eq!(events[0].timestamp_ms, 1_767_225_600_000);
}

#[test]
fn in_memory_sink_filters_by_action() {
    let sink = InMemoryAuditSink::new();
    for action in ["a", "b", "a"] {
        sink.append(&AuditEvent::new(epoch(), "test", action, json!(null))).unwrap();
    }
    assert_eq!(sink.events().len(), 3);
    assert_eq!(sink.events_with_action("a").len(), 2);
}
