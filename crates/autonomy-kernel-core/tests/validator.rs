// crates/autonomy-kernel-core/tests/validator.rs
// ============================================================================
// Module: Envelope Validator Tests
// Description: Structural, semantic, and attestation validation of envelopes.
// ============================================================================
//! ## Overview
//! Exercises every validator check family, content hash determinism, and
//! signed-envelope verification through the Ed25519 verifier.

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

use std::sync::Arc;

use autonomy_kernel_core::Clock;
use autonomy_kernel_core::SigningAlgorithm;
use autonomy_kernel_core::envelope::EscalationTrigger;
use autonomy_kernel_core::envelope::EvidenceRequirement;
use autonomy_kernel_core::runtime::Ed25519Signer;
use autonomy_kernel_core::runtime::EnvelopeValidator;
use autonomy_kernel_core::runtime::ValidationCode;
use autonomy_kernel_core::runtime::compute_content_hash;
use autonomy_kernel_core::runtime::sign_envelope;
use proptest::prelude::*;

use crate::common::allowance;
use crate::common::attest;
use crate::common::manual_clock;
use crate::common::sample_envelope;
use crate::common::test_signer;

/// Builds a validator on the fixed test clock.
fn validator() -> EnvelopeValidator {
    EnvelopeValidator::new().with_clock(Arc::new(manual_clock()))
}

#[test]
fn valid_envelope_reports_its_content_hash() {
    let envelope = sample_envelope();
    let result = validator().validate(&envelope);
    assert!(result.valid, "unexpected issues: {:?}", result.errors);
    assert!(result.errors.is_empty());
    assert_eq!(result.hash.as_deref(), Some(envelope.attestation.content_hash.as_str()));
    assert!(envelope.attestation.content_hash.starts_with("sha256:"));
}

#[test]
fn content_hash_ignores_attestation_fields() {
    let mut envelope = sample_envelope();
    let before = compute_content_hash(&envelope).unwrap();
    envelope.attestation.signer_id = Some("someone-else".to_string());
    envelope.attestation.signature = Some("00".repeat(64));
    assert_eq!(compute_content_hash(&envelope).unwrap(), before);
}

/// Tests that editing any covered field after attestation is detected as tamper.
#[test]
fn tampered_budget_is_a_hash_mismatch() {
    let mut envelope = sample_envelope();
    envelope.budgets.cost_ceiling_cents = 1_000_000;
    let result = validator().validate(&envelope);
    assert!(!result.valid);
    assert!(result.has_code(ValidationCode::HashMismatch));
    assert!(result.hash.is_none());
}

#[test]
fn missing_content_hash_is_required() {
    let mut envelope = sample_envelope();
    envelope.attestation.content_hash.clear();
    let result = validator().validate(&envelope);
    assert!(result.errors.iter().any(|issue| {
        issue.field == "attestation.content_hash" && issue.code == ValidationCode::Required
    }));
}

#[test]
fn all_issues_are_collected_not_just_the_first() {
    let mut envelope = sample_envelope();
    envelope.version.clear();
    envelope.format_version = "2.0.0".to_string();
    envelope.jurisdiction_scope.regulatory_mode = "lenient".to_string();
    envelope.budgets.tool_call_cap = 0;
    attest(&mut envelope);
    let result = validator().validate(&envelope);
    assert!(!result.valid);
    assert!(result.has_code(ValidationCode::Required));
    assert!(result.has_code(ValidationCode::UnsupportedFormat));
    assert!(result.has_code(ValidationCode::InvalidValue));
    assert!(result.errors.len() >= 4);
}

#[test]
fn inverted_window_and_expiry_are_rejected() {
    let clock = manual_clock();
    let mut envelope = sample_envelope();
    envelope.valid_from = Some(clock.now().plus_seconds(100));
    envelope.valid_until = Some(clock.now().plus_seconds(-10));
    attest(&mut envelope);
    let result = validator().validate(&envelope);
    assert!(result.has_code(ValidationCode::InvalidWindow));
    assert!(result.has_code(ValidationCode::Expired));
}

#[test]
fn jurisdiction_conflict_and_empty_allow_list() {
    let mut envelope = sample_envelope();
    envelope.jurisdiction_scope.prohibited_jurisdictions.push("US".to_string());
    attest(&mut envelope);
    assert!(validator().validate(&envelope).has_code(ValidationCode::Conflict));

    let mut envelope = sample_envelope();
    envelope.jurisdiction_scope.allowed_jurisdictions.clear();
    attest(&mut envelope);
    let result = validator().validate(&envelope);
    assert!(result.errors.iter().any(|issue| {
        issue.field == "jurisdiction_scope.allowed_jurisdictions"
            && issue.code == ValidationCode::Required
    }));
}

#[test]
fn effect_allowances_are_checked() {
    let mut envelope = sample_envelope();
    envelope.allowed_effects.push(allowance("E1", true, 0, 0));
    envelope.allowed_effects.push(allowance("E9", true, -1, -2));
    attest(&mut envelope);
    let result = validator().validate(&envelope);
    assert!(result.has_code(ValidationCode::Duplicate));
    assert!(result.errors.iter().any(|issue| issue.field.ends_with("max_per_run")));
    assert!(result.errors.iter().any(|issue| issue.field.ends_with("requires_approval_above")));
    assert!(result.errors.iter().any(|issue| {
        issue.field.ends_with("effect_class") && issue.code == ValidationCode::InvalidValue
    }));
}

#[test]
fn unknown_tokens_are_rejected() {
    let mut envelope = sample_envelope();
    envelope.data_handling.max_classification = "top_secret".to_string();
    envelope.budgets.blast_radius = Some("planet".to_string());
    envelope.required_evidence.push(EvidenceRequirement {
        action_class: String::new(),
        evidence_type: "photo".to_string(),
        when: "sometimes".to_string(),
        issuer_constraint: None,
    });
    attest(&mut envelope);
    let result = validator().validate(&envelope);
    for field in [
        "data_handling.max_classification",
        "budgets.blast_radius",
        "required_evidence[0].action_class",
        "required_evidence[0].evidence_type",
        "required_evidence[0].when",
    ] {
        assert!(result.errors.iter().any(|issue| issue.field == field), "missing issue for {field}");
    }
}

#[test]
fn require_approval_trigger_needs_quorum() {
    let mut envelope = sample_envelope();
    envelope.escalation_policy.escalation_triggers.push(EscalationTrigger {
        condition: "cost > 5000".to_string(),
        action: "require_approval".to_string(),
        approvers: vec!["ops".to_string()],
        quorum: 0,
        timeout_seconds: 600,
    });
    attest(&mut envelope);
    let result = validator().validate(&envelope);
    assert!(result.errors.iter().any(|issue| issue.field.ends_with(".quorum")));
}

#[test]
fn signed_envelope_verifies_with_matching_key() {
    let signer = test_signer();
    let mut envelope = sample_envelope();
    sign_envelope(&mut envelope, &signer, manual_clock().now()).unwrap();
    assert_eq!(envelope.attestation.algorithm.as_deref(), Some("ED25519"));

    let validator = validator().with_verifier(Arc::new(signer.verifier()));
    let result = validator.validate(&envelope);
    assert!(result.valid, "unexpected issues: {:?}", result.errors);
}

#[test]
fn signature_from_another_key_is_invalid() {
    let mut envelope = sample_envelope();
    sign_envelope(&mut envelope, &Ed25519Signer::generate("rogue"), manual_clock().now()).unwrap();
    let validator = validator().with_verifier(Arc::new(test_signer().verifier()));
    assert!(validator.validate(&envelope).has_code(ValidationCode::SignatureInvalid));
}

#[test]
fn disallowed_algorithm_is_rejected() {
    let mut envelope = sample_envelope();
    sign_envelope(&mut envelope, &test_signer(), manual_clock().now()).unwrap();
    let validator = validator().with_allowed_algorithms([SigningAlgorithm::EcdsaP256]);
    let result = validator.validate(&envelope);
    assert!(result.errors.iter().any(|issue| issue.field == "attestation.algorithm"));
}

proptest! {
    #[test]
    fn content_hash_is_a_pure_function_of_covered_fields(
        ceiling in 1i64..1_000_000,
        cap in 1i64..10_000,
        signer_id in "[a-z]{1,12}",
    ) {
        let mut envelope = sample_envelope();
        envelope.budgets.cost_ceiling_cents = ceiling;
        envelope.budgets.tool_call_cap = cap;
        let first = compute_content_hash(&envelope).unwrap();
        let copy = envelope.clone();
        prop_assert_eq!(compute_content_hash(&copy).unwrap(), first.clone());

        envelope.attestation.signer_id = Some(signer_id);
        prop_assert_eq!(compute_content_hash(&envelope).unwrap(), first.clone());

        envelope.budgets.tool_call_cap = cap + 1;
        prop_assert_ne!(compute_content_hash(&envelope).unwrap(), first);
    }
}
