// crates/autonomy-kernel-core/src/core/admission.rs
// ============================================================================
// Module: Envelope Admission Types
// Description: Effect requests, gate decisions, violation codes, and snapshots.
// Purpose: Define the value objects exchanged with the envelope gate.
// Dependencies: serde, crate::core::identifiers
// ============================================================================

//! ## Overview
//! These are the inputs and outputs of [`crate::runtime::EnvelopeGate`]. A
//! [`GateDecision`] is produced fresh per check and never mutated afterwards;
//! a [`GateSnapshot`] is an observability copy that must not feed back into
//! enforcement.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::envelope::EscalationAction;
use crate::core::identifiers::EnvelopeId;

// ============================================================================
// SECTION: Effect Request
// ============================================================================

/// An effect proposed for admission under the bound envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EffectRequest {
    /// Effect class token (`E0`..`E4`).
    pub effect_class: String,
    /// Effect type, for example `DATA_WRITE`.
    #[serde(default)]
    pub effect_type: String,
    /// Target jurisdiction code; empty skips the jurisdiction check.
    #[serde(default)]
    pub jurisdiction: String,
    /// Classification of touched data; empty skips the classification check.
    #[serde(default)]
    pub data_class: String,
    /// Estimated cost in minor currency units.
    #[serde(default)]
    pub estimated_cost: i64,
    /// Declared blast radius; empty skips the blast radius check.
    #[serde(default)]
    pub blast_radius: String,
}

// ============================================================================
// SECTION: Violations
// ============================================================================

/// Closed set of reasons an effect is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateViolation {
    /// No envelope is bound.
    NoEnvelope,
    /// The bound envelope has expired.
    EnvelopeExpired,
    /// The jurisdiction is prohibited or not allowed.
    JurisdictionDenied,
    /// The effect class or type is not allowed.
    EffectClassDenied,
    /// The per-class run cap is reached.
    EffectCountExceeded,
    /// The per-class escalation threshold is reached.
    EscalationRequired,
    /// The data classification exceeds the envelope maximum.
    DataClassificationExceeded,
    /// The cost ceiling would be exceeded.
    CostCeilingExceeded,
    /// The tool-call cap would be exceeded.
    ToolCallCapExceeded,
    /// The time ceiling is exceeded.
    TimeCeilingExceeded,
    /// The blast radius exceeds the envelope maximum.
    BlastRadiusExceeded,
}

impl GateViolation {
    /// Returns the stable wire code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoEnvelope => "NO_ENVELOPE",
            Self::EnvelopeExpired => "ENVELOPE_EXPIRED",
            Self::JurisdictionDenied => "JURISDICTION_DENIED",
            Self::EffectClassDenied => "EFFECT_CLASS_DENIED",
            Self::EffectCountExceeded => "EFFECT_COUNT_EXCEEDED",
            Self::EscalationRequired => "ESCALATION_REQUIRED",
            Self::DataClassificationExceeded => "DATA_CLASSIFICATION_EXCEEDED",
            Self::CostCeilingExceeded => "COST_CEILING_EXCEEDED",
            Self::ToolCallCapExceeded => "TOOL_CALL_CAP_EXCEEDED",
            Self::TimeCeilingExceeded => "TIME_CEILING_EXCEEDED",
            Self::BlastRadiusExceeded => "BLAST_RADIUS_EXCEEDED",
        }
    }
}

impl fmt::Display for GateViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Gate Decision
// ============================================================================

/// Outcome of one admission check.
///
/// # Invariants
/// - `violation` is `Some` exactly when `allowed` is false.
/// - `escalation_req` is only set alongside [`GateViolation::EscalationRequired`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    /// Whether the effect was admitted.
    pub allowed: bool,
    /// Human-readable reason.
    pub reason: String,
    /// Violation code when denied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation: Option<GateViolation>,
    /// Escalation the caller must route to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_req: Option<String>,
}

impl GateDecision {
    /// Builds an admission.
    #[must_use]
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: "within autonomy envelope bounds".to_string(),
            violation: None,
            escalation_req: None,
        }
    }

    /// Builds a denial.
    #[must_use]
    pub fn deny(violation: GateViolation, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            violation: Some(violation),
            escalation_req: None,
        }
    }

    /// Builds an escalation routing denial.
    #[must_use]
    pub fn escalate(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            violation: Some(GateViolation::EscalationRequired),
            escalation_req: Some(EscalationAction::REQUIRE_APPROVAL.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// Point-in-time copy of gate counters for observability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSnapshot {
    /// Bound envelope identifier.
    pub envelope_id: EnvelopeId,
    /// Bound envelope version.
    pub envelope_version: String,
    /// Admitted tool calls.
    pub tool_call_count: i64,
    /// Accumulated admitted cost.
    pub cost_accumulated: i64,
    /// Admitted count per effect class.
    pub effect_counts: BTreeMap<String, i64>,
    /// Seconds since bind.
    pub elapsed_seconds: f64,
}
