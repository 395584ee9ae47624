// crates/autonomy-kernel-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared fixtures for autonomy-kernel-core tests.
// Purpose: Provide envelopes, signed decisions, clocks, and recording drivers.
// Dependencies: autonomy-kernel-core, serde_json
// ============================================================================

//! ## Overview
//! Fixtures build a valid, attested envelope pinned to a fixed clock, and
//! signed decision/intent pairs that pass every executor authorization check.

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

use std::sync::Arc;
use std::sync::Mutex;

use autonomy_kernel_core::AuthorizedExecutionIntent;
use autonomy_kernel_core::AutonomyEnvelope;
use autonomy_kernel_core::DecisionId;
use autonomy_kernel_core::DecisionRecord;
use autonomy_kernel_core::DriverError;
use autonomy_kernel_core::Effect;
use autonomy_kernel_core::EffectId;
use autonomy_kernel_core::EnvelopeId;
use autonomy_kernel_core::IntentId;
use autonomy_kernel_core::Signer;
use autonomy_kernel_core::TenantId;
use autonomy_kernel_core::Timestamp;
use autonomy_kernel_core::ToolDriver;
use autonomy_kernel_core::ToolName;
use autonomy_kernel_core::VERDICT_PASS;
use autonomy_kernel_core::envelope::DataHandlingRules;
use autonomy_kernel_core::envelope::EffectClassAllowance;
use autonomy_kernel_core::envelope::EnvelopeAttestation;
use autonomy_kernel_core::envelope::EnvelopeBudgets;
use autonomy_kernel_core::envelope::EscalationPolicy;
use autonomy_kernel_core::envelope::JurisdictionConstraint;
use autonomy_kernel_core::envelope::SUPPORTED_FORMAT_VERSION;
use autonomy_kernel_core::runtime::Ed25519Signer;
use autonomy_kernel_core::runtime::ManualClock;
use autonomy_kernel_core::runtime::compute_content_hash;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Fixed test epoch: 2026-01-01T00:00:00Z.
pub const EPOCH_SECONDS: i64 = 1_767_225_600;

/// Returns the fixed test epoch.
pub fn epoch() -> Timestamp {
    Timestamp::from_unix_seconds(EPOCH_SECONDS).expect("epoch")
}

/// Returns a manual clock frozen at the test epoch.
pub fn manual_clock() -> ManualClock {
    ManualClock::new(epoch())
}

// ============================================================================
// SECTION: Envelopes
// ============================================================================

/// Builds one allowance entry.
pub fn allowance(class: &str, allowed: bool, max_per_run: i64, approval_above: i64) -> EffectClassAllowance {
    EffectClassAllowance {
        effect_class: class.to_string(),
        allowed,
        allowed_types: Vec::new(),
        max_per_run,
        requires_approval_above: approval_above,
    }
}

/// Builds a valid envelope (cost ceiling 10000, E4 denied) with a correct
/// content hash and no signature.
pub fn sample_envelope() -> AutonomyEnvelope {
    let mut envelope = AutonomyEnvelope {
        envelope_id: EnvelopeId::new("env-test-001"),
        version: "1.0.0".to_string(),
        format_version: SUPPORTED_FORMAT_VERSION.to_string(),
        valid_from: Some(epoch().plus_seconds(-3600)),
        valid_until: Some(epoch().plus_seconds(86_400)),
        tenant_id: Some(TenantId::new("tenant-a")),
        jurisdiction_scope: JurisdictionConstraint {
            allowed_jurisdictions: vec!["US".to_string(), "EU".to_string()],
            regulatory_mode: "strict".to_string(),
            data_residency_regions: vec!["us-east-1".to_string()],
            prohibited_jurisdictions: vec!["KP".to_string()],
        },
        data_handling: DataHandlingRules {
            max_classification: "confidential".to_string(),
            redaction_policy: "pii_only".to_string(),
            transfer_constraints: Vec::new(),
        },
        allowed_effects: vec![
            allowance("E0", true, 0, 0),
            allowance("E1", true, 0, 0),
            allowance("E2", true, 0, 0),
            allowance("E3", true, 0, 0),
            allowance("E4", false, 0, 0),
        ],
        budgets: EnvelopeBudgets {
            cost_ceiling_cents: 10_000,
            time_ceiling_seconds: 3600,
            tool_call_cap: 100,
            rate_limits: Vec::new(),
            blast_radius: Some("dataset".to_string()),
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
    attest(&mut envelope);
    envelope
}

/// Recomputes the attestation content hash after a fixture edit.
pub fn attest(envelope: &mut AutonomyEnvelope) {
    envelope.attestation.content_hash = compute_content_hash(envelope).expect("content hash");
}

// ============================================================================
// SECTION: Authorization
// ============================================================================

/// Returns a deterministic signer.
pub fn test_signer() -> Ed25519Signer {
    Ed25519Signer::from_secret_bytes("kernel-test", &[7u8; 32])
}

/// Builds an effect invoking `tool`.
pub fn effect(id: &str, tool: &str) -> Effect {
    let mut params = Map::new();
    params.insert("tool_name".to_string(), json!(tool));
    params.insert("path".to_string(), json!("/tmp/report.txt"));
    Effect {
        effect_id: EffectId::new(id),
        params,
        args_hash: Some("sha256:args".to_string()),
        output_hash: None,
    }
}

/// Builds a signed `PASS` decision, optionally scoped to a session.
pub fn signed_decision(signer: &dyn Signer, id: &str, session: Option<&str>) -> DecisionRecord {
    let mut input_context = Map::new();
    if let Some(session) = session {
        input_context.insert("session_id".to_string(), json!(session));
    }
    input_context.insert("tenant_id".to_string(), json!("tenant-a"));
    let mut decision = DecisionRecord {
        id: DecisionId::new(id),
        phenotype_hash: None,
        snapshot: None,
        verdict: VERDICT_PASS.to_string(),
        reason: "policy satisfied".to_string(),
        input_context,
        signature: String::new(),
        signature_type: String::new(),
        timestamp: Some(epoch()),
    };
    signer.sign_decision(&mut decision).expect("sign decision");
    decision
}

/// Builds a signed intent for a decision, valid for one hour from the epoch.
pub fn signed_intent(signer: &dyn Signer, decision: &DecisionRecord, tool: &str) -> AuthorizedExecutionIntent {
    let mut intent = AuthorizedExecutionIntent {
        id: IntentId::new(format!("intent-{}", decision.id)),
        decision_id: decision.id.clone(),
        effect_digest_hash: None,
        idempotency_key: None,
        issued_at: Some(epoch()),
        expires_at: epoch().plus_seconds(3600),
        signer: Some("kernel-test".to_string()),
        signature: String::new(),
        allowed_tool: Some(ToolName::new(tool)),
    };
    signer.sign_intent(&mut intent).expect("sign intent");
    intent
}

// ============================================================================
// SECTION: Drivers
// ============================================================================

/// Tool driver that records calls and returns a fixed output.
#[derive(Clone)]
pub struct RecordingDriver {
    /// Calls received.
    calls: Arc<Mutex<Vec<ToolName>>>,
    /// Output returned for every call.
    output: Value,
}

impl RecordingDriver {
    /// Creates a driver returning `output`.
    pub fn new(output: Value) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            output,
        }
    }

    /// Returns the number of calls received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ToolDriver for RecordingDriver {
    fn execute(&self, tool: &ToolName, _params: &Map<String, Value>) -> Result<Value, DriverError> {
        self.calls.lock().unwrap().push(tool.clone());
        Ok(self.output.clone())
    }
}

/// Tool driver that always fails.
pub struct FailingDriver {
    /// Whether failures are transient.
    pub transient: bool,
}

impl ToolDriver for FailingDriver {
    fn execute(&self, tool: &ToolName, _params: &Map<String, Value>) -> Result<Value, DriverError> {
        if self.transient {
            Err(DriverError::Unavailable(format!("{tool} backend offline")))
        } else {
            Err(DriverError::Failed(format!("{tool} rejected the request")))
        }
    }
}
