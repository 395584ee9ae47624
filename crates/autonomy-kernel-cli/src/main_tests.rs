// crates/autonomy-kernel-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for bounded reads and key resolution.
// Purpose: Ensure CLI inputs fail closed on oversized or malformed data.
// Dependencies: autonomy-kernel-cli main helpers, tempfile
// ============================================================================

//! ## Overview
//! Validates `read_bytes_with_limit`, `read_json`, and verifier resolution.

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

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use autonomy_kernel_config::KernelConfig;
use autonomy_kernel_core::runtime::Ed25519Signer;

use super::LeafInput;
use super::ReadLimitError;
use super::read_bytes_with_limit;
use super::read_json;
use super::resolve_unix_seconds;
use super::resolve_verifier;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn read_bytes_with_limit_allows_small_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("small.bin");
    fs::write(&path, b"ok").expect("write small file");

    let bytes = read_bytes_with_limit(&path, 16).expect("read small file");
    assert_eq!(bytes, b"ok");
}

#[test]
fn read_bytes_with_limit_accepts_file_at_limit() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("exact.bin");
    fs::write(&path, [7_u8; 8]).expect("write file");

    let bytes = read_bytes_with_limit(&path, 8).expect("read file at limit");
    assert_eq!(bytes.len(), 8);
}

#[test]
fn read_bytes_with_limit_rejects_large_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("large.bin");
    let limit = 8_usize;
    fs::write(&path, vec![0_u8; limit + 1]).expect("write large file");

    let err = read_bytes_with_limit(&path, limit).expect_err("expected size limit failure");
    match err {
        ReadLimitError::TooLarge {
            size,
            limit: reported,
        } => {
            let limit_u64 = u64::try_from(limit).expect("limit fits");
            assert!(size > limit_u64);
            assert_eq!(reported, limit);
        }
        ReadLimitError::Io(err) => panic!("unexpected IO error: {err}"),
    }
}

#[test]
fn read_bytes_with_limit_reports_missing_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = read_bytes_with_limit(&dir.path().join("absent.json"), 16)
        .expect_err("expected io failure");
    assert!(matches!(err, ReadLimitError::Io(_)));
}

#[test]
fn read_json_reports_parse_failures_with_kind() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("leaves.json");
    fs::write(&path, b"{not json").expect("write file");

    let err = read_json::<Vec<LeafInput>>(&path, "leaves", 1024).expect_err("parse failure");
    assert!(err.to_string().starts_with("Failed to parse leaves at"));
}

#[test]
fn read_json_defaults_leaf_sealed_to_false() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("leaves.json");
    fs::write(&path, br#"[{"path":"a","value":1}]"#).expect("write file");

    let leaves = read_json::<Vec<LeafInput>>(&path, "leaves", 1024).expect("parse leaves");
    assert_eq!(leaves.len(), 1);
    assert!(!leaves[0].sealed);
}

#[test]
fn resolve_verifier_prefers_explicit_key() {
    let signer = Ed25519Signer::from_secret_bytes("cli", &[3; 32]);
    let config = KernelConfig::default();
    let verifier = resolve_verifier(Some(&signer.public_key_hex()), &config).expect("resolve");
    assert!(verifier.is_some());
}

#[test]
fn resolve_verifier_without_key_returns_none() {
    let config = KernelConfig::default();
    let verifier = resolve_verifier(None, &config).expect("resolve");
    assert!(verifier.is_none());
}

#[test]
fn resolve_verifier_rejects_malformed_key() {
    let config = KernelConfig::default();
    let err = resolve_verifier(Some("zz"), &config).expect_err("malformed key");
    assert!(err.to_string().starts_with("Invalid public key"));
}

#[test]
fn resolve_unix_seconds_accepts_epoch() {
    let instant = resolve_unix_seconds(0).expect("epoch");
    assert_eq!(Some(instant), autonomy_kernel_core::Timestamp::from_unix_seconds(0));
}
