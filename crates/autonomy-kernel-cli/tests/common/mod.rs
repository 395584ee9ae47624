// crates/autonomy-kernel-cli/tests/common/mod.rs
// ============================================================================
// Module: CLI Test Utilities
// Description: Shared fixtures for autonomy-kernel binary tests.
// Purpose: Write signed envelopes and receipt chains, then run the binary.
// Dependencies: autonomy-kernel-core, serde_json, tempfile
// ============================================================================

//! ## Overview
//! Fixtures are written into a temp directory and passed to the compiled
//! `autonomy-kernel` binary by path. Output is parsed back as JSON.

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
    dead_code,
    reason = "Test-only helpers; not every test binary uses every fixture."
)]

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use autonomy_kernel_core::AutonomyEnvelope;
use autonomy_kernel_core::DecisionId;
use autonomy_kernel_core::EffectId;
use autonomy_kernel_core::EnvelopeId;
use autonomy_kernel_core::GENESIS_PREV_HASH;
use autonomy_kernel_core::Receipt;
use autonomy_kernel_core::ReceiptStatus;
use autonomy_kernel_core::SessionId;
use autonomy_kernel_core::Signer;
use autonomy_kernel_core::TenantId;
use autonomy_kernel_core::Timestamp;
use autonomy_kernel_core::envelope::DataHandlingRules;
use autonomy_kernel_core::envelope::EffectClassAllowance;
use autonomy_kernel_core::envelope::EnvelopeAttestation;
use autonomy_kernel_core::envelope::EnvelopeBudgets;
use autonomy_kernel_core::envelope::EscalationPolicy;
use autonomy_kernel_core::envelope::JurisdictionConstraint;
use autonomy_kernel_core::envelope::SUPPORTED_FORMAT_VERSION;
use autonomy_kernel_core::runtime::Ed25519Signer;
use autonomy_kernel_core::runtime::sign_envelope;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Binary
// ============================================================================

/// Fixed test epoch: 2026-01-01T00:00:00Z.
pub const EPOCH_SECONDS: i64 = 1_767_225_600;

/// Returns the compiled CLI binary path.
pub fn kernel_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_autonomy-kernel"))
}

/// Runs the binary with `args`.
pub fn run(args: &[&str]) -> Output {
    Command::new(kernel_bin()).args(args).output().expect("run autonomy-kernel")
}

/// Parses stdout as a JSON value.
pub fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is json")
}

/// Returns stderr as text.
pub fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Writes `value` as JSON to `dir/name` and returns the path as a string.
pub fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> String {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_vec(value).expect("serialize fixture")).expect("write fixture");
    path.to_string_lossy().into_owned()
}

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Returns the fixed test epoch.
pub fn epoch() -> Timestamp {
    Timestamp::from_unix_seconds(EPOCH_SECONDS).expect("epoch")
}

/// Returns the deterministic test signer.
pub fn test_signer() -> Ed25519Signer {
    Ed25519Signer::from_secret_bytes("cli-test", &[5; 32])
}

/// Builds one allowance entry.
fn allowance(class: &str, allowed: bool) -> EffectClassAllowance {
    EffectClassAllowance {
        effect_class: class.to_string(),
        allowed,
        allowed_types: Vec::new(),
        max_per_run: 0,
        requires_approval_above: 0,
    }
}

/// Builds an envelope valid around the test epoch, signed by `signer`.
pub fn signed_envelope(signer: &Ed25519Signer) -> AutonomyEnvelope {
    let mut envelope = AutonomyEnvelope {
        envelope_id: EnvelopeId::new("env-cli-001"),
        version: "1.0.0".to_string(),
        format_version: SUPPORTED_FORMAT_VERSION.to_string(),
        valid_from: Some(epoch().plus_seconds(-3600)),
        valid_until: Some(epoch().plus_seconds(3600)),
        tenant_id: Some(TenantId::new("tenant-a")),
        jurisdiction_scope: JurisdictionConstraint {
            allowed_jurisdictions: vec!["US".to_string()],
            regulatory_mode: "strict".to_string(),
            data_residency_regions: Vec::new(),
            prohibited_jurisdictions: Vec::new(),
        },
        data_handling: DataHandlingRules {
            max_classification: "internal".to_string(),
            redaction_policy: "pii_only".to_string(),
            transfer_constraints: Vec::new(),
        },
        allowed_effects: vec![
            allowance("E0", true),
            allowance("E1", true),
            allowance("E2", true),
            allowance("E3", false),
            allowance("E4", false),
        ],
        budgets: EnvelopeBudgets {
            cost_ceiling_cents: 500,
            time_ceiling_seconds: 600,
            tool_call_cap: 10,
            rate_limits: Vec::new(),
            blast_radius: None,
            compute_units_cap: None,
        },
        required_evidence: Vec::new(),
        escalation_policy: EscalationPolicy {
            default_mode: "supervised".to_string(),
            escalation_triggers: Vec::new(),
            judgment_taxonomy: Vec::new(),
        },
        attestation: EnvelopeAttestation::default(),
    };
    sign_envelope(&mut envelope, signer, epoch()).expect("sign envelope");
    envelope
}

/// Builds a signed receipt chain of `len` entries in `session`.
pub fn signed_chain(signer: &Ed25519Signer, session: &str, len: u64) -> Vec<Receipt> {
    let mut chain: Vec<Receipt> = Vec::new();
    for clock in 1..=len {
        let prev_hash = chain.last().map_or(GENESIS_PREV_HASH, |prev| prev.signature.as_str()).to_string();
        let decision_id = DecisionId::new(format!("{session}-dec-{clock}"));
        let mut receipt = Receipt {
            receipt_id: Receipt::id_for(&decision_id),
            decision_id,
            effect_id: EffectId::new(format!("{session}-eff-{clock}")),
            session_id: Some(SessionId::new(session)),
            status: ReceiptStatus::Success,
            blob_hash: None,
            output_hash: format!("sha256:{}", "ab".repeat(32)),
            args_hash: None,
            timestamp: epoch(),
            prev_hash,
            lamport_clock: clock,
            signature: String::new(),
        };
        signer.sign_receipt(&mut receipt).expect("sign receipt");
        chain.push(receipt);
    }
    chain
}
