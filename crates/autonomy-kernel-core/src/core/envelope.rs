// crates/autonomy-kernel-core/src/core/envelope.rs
// ============================================================================
// Module: Autonomy Envelope Model
// Description: Signed contract bounding what one autonomous run may do.
// Purpose: Define the serializable envelope schema and its closed token sets.
// Dependencies: serde, crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! An [`AutonomyEnvelope`] bounds an autonomous run: where it may act
//! (jurisdictions), what data it may touch, which effect classes it may
//! emit, how much it may spend, what evidence it must leave, and how it
//! escalates. The envelope is built and signed outside the kernel, validated
//! by [`crate::runtime::EnvelopeValidator`], and bound read-only into an
//! [`crate::runtime::EnvelopeGate`].
//!
//! Enumerated fields stay as raw string tokens on the wire so that an
//! unrecognized value survives deserialization and is reported by the
//! validator instead of being silently dropped. Typed views live in the
//! token enums below; each `parse` returns `None` for unknown input and
//! callers must handle that arm explicitly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::EnvelopeId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// The only envelope schema format version the kernel accepts.
pub const SUPPORTED_FORMAT_VERSION: &str = "1.0.0";

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// Signed contract bounding one autonomous run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutonomyEnvelope {
    /// Envelope identifier.
    pub envelope_id: EnvelopeId,
    /// Semantic version of this envelope.
    pub version: String,
    /// Schema format version (must be `1.0.0`).
    pub format_version: String,
    /// Start of the validity window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<Timestamp>,
    /// End of the validity window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<Timestamp>,
    /// Tenant scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<TenantId>,
    /// Jurisdiction constraints.
    pub jurisdiction_scope: JurisdictionConstraint,
    /// Data handling rules.
    pub data_handling: DataHandlingRules,
    /// Effect-class allowances, one entry per class.
    pub allowed_effects: Vec<EffectClassAllowance>,
    /// Budget ceilings.
    pub budgets: EnvelopeBudgets,
    /// Evidence obligations.
    #[serde(default)]
    pub required_evidence: Vec<EvidenceRequirement>,
    /// Escalation policy.
    pub escalation_policy: EscalationPolicy,
    /// Attestation over all other fields.
    #[serde(default)]
    pub attestation: EnvelopeAttestation,
}

/// Jurisdiction constraints for an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JurisdictionConstraint {
    /// Jurisdiction codes effects may target.
    #[serde(default)]
    pub allowed_jurisdictions: Vec<String>,
    /// Regulatory mode token (`strict`, `permissive`, `audit_only`).
    pub regulatory_mode: String,
    /// Regions where data must reside.
    #[serde(default)]
    pub data_residency_regions: Vec<String>,
    /// Jurisdiction codes effects may never target.
    #[serde(default)]
    pub prohibited_jurisdictions: Vec<String>,
}

/// Data handling rules for an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataHandlingRules {
    /// Maximum data classification token.
    pub max_classification: String,
    /// Redaction policy token (`none`, `pii_only`, `strict`).
    pub redaction_policy: String,
    /// Cross-region transfer constraints.
    #[serde(default)]
    pub transfer_constraints: Vec<TransferConstraint>,
}

/// Cross-region data transfer rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConstraint {
    /// Source region.
    pub from_region: String,
    /// Destination region.
    pub to_region: String,
    /// Whether the transfer is permitted.
    pub allowed: bool,
    /// Whether the transfer must be encrypted.
    #[serde(default)]
    pub requires_encryption: bool,
}

/// Allowance entry for one effect class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectClassAllowance {
    /// Effect class token (`E0`..`E4`).
    pub effect_class: String,
    /// Whether the class is allowed at all.
    pub allowed: bool,
    /// Optional restriction to specific effect types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_types: Vec<String>,
    /// Per-run cap; zero means uncapped.
    #[serde(default)]
    pub max_per_run: i64,
    /// Count at or above which escalation is required; zero disables.
    #[serde(default)]
    pub requires_approval_above: i64,
}

/// Budget ceilings for an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvelopeBudgets {
    /// Cost ceiling in minor currency units.
    pub cost_ceiling_cents: i64,
    /// Wall-clock ceiling in seconds.
    pub time_ceiling_seconds: i64,
    /// Maximum number of tool calls.
    pub tool_call_cap: i64,
    /// Per-resource rate limits.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rate_limits: Vec<RateLimit>,
    /// Maximum blast radius token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blast_radius: Option<String>,
    /// Optional compute unit cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_units_cap: Option<i64>,
}

/// Per-resource rate limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Limited resource name.
    pub resource: String,
    /// Maximum operations per minute.
    pub max_per_minute: i64,
}

/// Evidence obligation for an action class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRequirement {
    /// Action class the requirement applies to.
    pub action_class: String,
    /// Evidence type token.
    pub evidence_type: String,
    /// Timing token (`before`, `after`, `both`).
    pub when: String,
    /// Optional issuer constraint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_constraint: Option<String>,
}

/// Escalation policy for an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EscalationPolicy {
    /// Default operating mode token.
    pub default_mode: String,
    /// Conditions that trigger escalation.
    #[serde(default)]
    pub escalation_triggers: Vec<EscalationTrigger>,
    /// Judgment classification per category.
    #[serde(default)]
    pub judgment_taxonomy: Vec<JudgmentCategory>,
}

/// One escalation trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationTrigger {
    /// Trigger condition expression.
    pub condition: String,
    /// Action token (`require_approval`, `pause_and_notify`, `abort`).
    pub action: String,
    /// Approver identities.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approvers: Vec<String>,
    /// Required approvals for `require_approval`.
    #[serde(default)]
    pub quorum: i64,
    /// Approval timeout in seconds.
    #[serde(default)]
    pub timeout_seconds: i64,
}

/// Judgment classification for a decision category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentCategory {
    /// Category name.
    pub category: String,
    /// Classification token (`autonomous`, `judgment_required`).
    pub classification: String,
}

/// Attestation binding the envelope content to a signer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvelopeAttestation {
    /// `sha256:`-prefixed content hash over all non-attestation fields.
    #[serde(default)]
    pub content_hash: String,
    /// Hex-encoded signature over the content hash, if signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Signer identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_id: Option<String>,
    /// Signing time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<Timestamp>,
    /// Signing algorithm token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
}

impl AutonomyEnvelope {
    /// Returns the allowance entry for an effect class, if declared.
    #[must_use]
    pub fn allowance(&self, effect_class: &str) -> Option<&EffectClassAllowance> {
        self.allowed_effects.iter().find(|entry| entry.effect_class == effect_class)
    }
}

// ============================================================================
// SECTION: Token Sets
// ============================================================================

/// Data classification, ordered from least to most sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DataClassification {
    /// Public data.
    Public,
    /// Internal data.
    Internal,
    /// Confidential data.
    Confidential,
    /// Restricted data.
    Restricted,
}

impl DataClassification {
    /// Parses a classification token; unknown tokens yield `None`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "public" => Some(Self::Public),
            "internal" => Some(Self::Internal),
            "confidential" => Some(Self::Confidential),
            "restricted" => Some(Self::Restricted),
            _ => None,
        }
    }
}

/// Blast radius, ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BlastRadius {
    /// A single record.
    SingleRecord,
    /// A whole dataset.
    Dataset,
    /// The whole system.
    SystemWide,
}

impl BlastRadius {
    /// Parses a blast radius token; unknown tokens yield `None`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "single_record" => Some(Self::SingleRecord),
            "dataset" => Some(Self::Dataset),
            "system_wide" => Some(Self::SystemWide),
            _ => None,
        }
    }
}

/// Effect class `E0` (read-only) through `E4` (irreversible).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EffectClass {
    /// `E0`.
    E0,
    /// `E1`.
    E1,
    /// `E2`.
    E2,
    /// `E3`.
    E3,
    /// `E4`.
    E4,
}

impl EffectClass {
    /// Parses an effect class token; unknown tokens yield `None`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "E0" => Some(Self::E0),
            "E1" => Some(Self::E1),
            "E2" => Some(Self::E2),
            "E3" => Some(Self::E3),
            "E4" => Some(Self::E4),
            _ => None,
        }
    }
}

/// Regulatory mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegulatoryMode {
    /// Enforce strictly.
    Strict,
    /// Enforce permissively.
    Permissive,
    /// Observe and record only.
    AuditOnly,
}

impl RegulatoryMode {
    /// Parses a regulatory mode token.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "strict" => Some(Self::Strict),
            "permissive" => Some(Self::Permissive),
            "audit_only" => Some(Self::AuditOnly),
            _ => None,
        }
    }
}

/// Redaction policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedactionPolicy {
    /// No redaction.
    None,
    /// Redact personal data only.
    PiiOnly,
    /// Redact aggressively.
    Strict,
}

impl RedactionPolicy {
    /// Parses a redaction policy token.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "none" => Some(Self::None),
            "pii_only" => Some(Self::PiiOnly),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }
}

/// Evidence type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceType {
    /// Signed execution receipt.
    Receipt,
    /// Hash inclusion proof.
    HashProof,
    /// Two independent attestations.
    DualAttestation,
    /// Third-party verification.
    ExternalVerification,
    /// Deterministic replay proof.
    ReplayProof,
}

impl EvidenceType {
    /// Parses an evidence type token.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "receipt" => Some(Self::Receipt),
            "hash_proof" => Some(Self::HashProof),
            "dual_attestation" => Some(Self::DualAttestation),
            "external_verification" => Some(Self::ExternalVerification),
            "replay_proof" => Some(Self::ReplayProof),
            _ => None,
        }
    }
}

/// When evidence must be produced relative to the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceTiming {
    /// Before the action.
    Before,
    /// After the action.
    After,
    /// Both before and after.
    Both,
}

impl EvidenceTiming {
    /// Parses an evidence timing token.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "before" => Some(Self::Before),
            "after" => Some(Self::After),
            "both" => Some(Self::Both),
            _ => None,
        }
    }
}

/// Default escalation operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationMode {
    /// Runs without supervision.
    Autonomous,
    /// Runs under supervision.
    Supervised,
    /// Every effect is manual.
    Manual,
}

impl EscalationMode {
    /// Parses an escalation mode token.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "autonomous" => Some(Self::Autonomous),
            "supervised" => Some(Self::Supervised),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

/// Escalation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationAction {
    /// Route to approvers.
    RequireApproval,
    /// Pause the run and notify.
    PauseAndNotify,
    /// Abort the run.
    Abort,
}

impl EscalationAction {
    /// Wire token for [`EscalationAction::RequireApproval`].
    pub const REQUIRE_APPROVAL: &'static str = "require_approval";

    /// Parses an escalation action token.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            Self::REQUIRE_APPROVAL => Some(Self::RequireApproval),
            "pause_and_notify" => Some(Self::PauseAndNotify),
            "abort" => Some(Self::Abort),
            _ => None,
        }
    }
}

/// Judgment classification for a decision category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgmentClassification {
    /// May be decided autonomously.
    Autonomous,
    /// Requires human judgment.
    JudgmentRequired,
}

impl JudgmentClassification {
    /// Parses a judgment classification token.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "autonomous" => Some(Self::Autonomous),
            "judgment_required" => Some(Self::JudgmentRequired),
            _ => None,
        }
    }
}

/// Envelope signing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// Ed25519.
    #[serde(rename = "ED25519")]
    Ed25519,
    /// ECDSA over P-256.
    #[serde(rename = "ECDSA-P256")]
    EcdsaP256,
    /// RSA-PSS with a 2048-bit modulus.
    #[serde(rename = "RSA-PSS-2048")]
    RsaPss2048,
}

impl SigningAlgorithm {
    /// All algorithms the kernel recognizes.
    pub const ALL: [Self; 3] = [Self::Ed25519, Self::EcdsaP256, Self::RsaPss2048];

    /// Parses an algorithm token.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "ED25519" => Some(Self::Ed25519),
            "ECDSA-P256" => Some(Self::EcdsaP256),
            "RSA-PSS-2048" => Some(Self::RsaPss2048),
            _ => None,
        }
    }

    /// Returns the wire token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ed25519 => "ED25519",
            Self::EcdsaP256 => "ECDSA-P256",
            Self::RsaPss2048 => "RSA-PSS-2048",
        }
    }
}
