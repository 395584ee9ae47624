// crates/autonomy-kernel-cli/tests/envelope_commands.rs
// ============================================================================
// Module: CLI Envelope Command Tests
// Description: Integration tests for `envelope validate` and `envelope hash`.
// Purpose: Ensure validation reports every issue and exits non-zero on failure.
// Dependencies: autonomy-kernel binary, autonomy-kernel-core, tempfile
// ============================================================================

//! ## Overview
//! Runs the compiled binary against signed envelope fixtures, tampered
//! copies, wrong keys, and restrictive configs.

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

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use autonomy_kernel_core::runtime::Ed25519Signer;
use autonomy_kernel_core::runtime::compute_content_hash;
use serde_json::Value;

use crate::common::EPOCH_SECONDS;
use crate::common::run;
use crate::common::signed_envelope;
use crate::common::stderr_text;
use crate::common::stdout_json;
use crate::common::test_signer;
use crate::common::write_json;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Collects the issue codes from a validation report; valid reports omit `errors`.
fn error_codes(report: &Value) -> Vec<String> {
    report.get("errors").and_then(Value::as_array).map_or_else(Vec::new, |issues| {
        issues.iter().map(|issue| issue["code"].as_str().expect("code").to_string()).collect()
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn validate_accepts_signed_envelope() {
    let dir = tempfile::tempdir().expect("temp dir");
    let signer = test_signer();
    let envelope = signed_envelope(&signer);
    let path = write_json(dir.path(), "envelope.json", &envelope);
    let now = EPOCH_SECONDS.to_string();
    let key = signer.public_key_hex();

    let output = run(&[
        "envelope",
        "validate",
        "--envelope",
        &path,
        "--public-key",
        &key,
        "--now-unix",
        &now,
    ]);

    assert!(output.status.success(), "stderr: {}", stderr_text(&output));
    let report = stdout_json(&output);
    assert_eq!(report["valid"], Value::Bool(true));
    assert!(error_codes(&report).is_empty());
    assert_eq!(report["hash"], Value::String(envelope.attestation.content_hash));
}

/// Tests an edit after signing is reported as tamper.
#[test]
fn validate_reports_tampered_envelope() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut envelope = signed_envelope(&test_signer());
    envelope.budgets.tool_call_cap = 10_000;
    let path = write_json(dir.path(), "envelope.json", &envelope);
    let now = EPOCH_SECONDS.to_string();

    let output = run(&["envelope", "validate", "--envelope", &path, "--now-unix", &now]);

    assert!(!output.status.success());
    let codes = error_codes(&stdout_json(&output));
    assert!(codes.contains(&"HASH_MISMATCH".to_string()), "codes: {codes:?}");
}

#[test]
fn validate_rejects_signature_from_other_key() {
    let dir = tempfile::tempdir().expect("temp dir");
    let envelope = signed_envelope(&test_signer());
    let path = write_json(dir.path(), "envelope.json", &envelope);
    let other = Ed25519Signer::from_secret_bytes("other", &[9; 32]).public_key_hex();
    let now = EPOCH_SECONDS.to_string();

    let output = run(&[
        "envelope",
        "validate",
        "--envelope",
        &path,
        "--public-key",
        &other,
        "--now-unix",
        &now,
    ]);

    assert!(!output.status.success());
    let codes = error_codes(&stdout_json(&output));
    assert_eq!(codes, vec!["SIGNATURE_INVALID".to_string()]);
}

#[test]
fn validate_reports_expiry_at_supplied_time() {
    let dir = tempfile::tempdir().expect("temp dir");
    let envelope = signed_envelope(&test_signer());
    let path = write_json(dir.path(), "envelope.json", &envelope);
    let later = (EPOCH_SECONDS + 7200).to_string();

    let output = run(&["envelope", "validate", "--envelope", &path, "--now-unix", &later]);

    assert!(!output.status.success());
    let codes = error_codes(&stdout_json(&output));
    assert!(codes.contains(&"EXPIRED".to_string()), "codes: {codes:?}");
}

#[test]
fn validate_applies_config_algorithm_allowlist() {
    let dir = tempfile::tempdir().expect("temp dir");
    let envelope = signed_envelope(&test_signer());
    let path = write_json(dir.path(), "envelope.json", &envelope);
    let config_path = dir.path().join("autonomy-kernel.toml");
    fs::write(&config_path, "[validator]\nallowed_algorithms = [\"ECDSA-P256\"]\n")
        .expect("write config");
    let config = config_path.to_string_lossy().into_owned();
    let now = EPOCH_SECONDS.to_string();

    let output = run(&[
        "envelope",
        "validate",
        "--envelope",
        &path,
        "--config",
        &config,
        "--now-unix",
        &now,
    ]);

    assert!(!output.status.success());
    let report = stdout_json(&output);
    let fields: Vec<&str> = report["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .map(|issue| issue["field"].as_str().expect("field"))
        .collect();
    assert_eq!(fields, vec!["attestation.algorithm"]);
}

#[test]
fn validate_reports_unreadable_envelope_on_stderr() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("missing.json").to_string_lossy().into_owned();

    let output = run(&["envelope", "validate", "--envelope", &missing]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(stderr_text(&output).contains("Failed to read envelope"));
}

#[test]
fn hash_prints_content_hash() {
    let dir = tempfile::tempdir().expect("temp dir");
    let envelope = signed_envelope(&test_signer());
    let path = write_json(dir.path(), "envelope.json", &envelope);

    let output = run(&["envelope", "hash", "--envelope", &path]);

    assert!(output.status.success(), "stderr: {}", stderr_text(&output));
    let expected = compute_content_hash(&envelope).expect("content hash");
    assert_eq!(stdout_json(&output)["content_hash"], Value::String(expected));
}
