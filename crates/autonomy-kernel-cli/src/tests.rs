// crates/autonomy-kernel-cli/src/tests.rs
// ============================================================================
// Module: CLI Library Tests
// Description: Unit tests for the CLI message catalog.
// Purpose: Ensure catalog lookups and placeholder substitution are stable.
// Dependencies: autonomy-kernel-cli
// ============================================================================

//! ## Overview
//! Validates catalog lookups, placeholder substitution, and key fallback.

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

use crate::i18n::MessageArg;
use crate::i18n::translate;
use crate::t;

#[test]
fn known_key_substitutes_placeholders() {
    let message = t!("input.read_too_large", kind = "envelope", path = "e.json", size = 9, limit = 8);
    assert_eq!(message, "Refusing to read envelope at e.json because it is 9 bytes (limit 8).");
}

#[test]
fn missing_key_falls_back_to_key() {
    assert_eq!(translate("no.such.key", Vec::new()), "no.such.key");
}

#[test]
fn unused_arguments_are_ignored() {
    let message = translate("config.validate.ok", vec![MessageArg::new("extra", "x")]);
    assert_eq!(message, "Config valid.");
}
