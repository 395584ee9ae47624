// crates/autonomy-kernel-core/src/runtime/validator.rs
// ============================================================================
// Module: Envelope Validator
// Description: Structural, semantic, and attestation checks for autonomy envelopes.
// Purpose: Reject malformed or tampered envelopes before they can be bound.
// Dependencies: crate::{core, interfaces}, serde
// ============================================================================

//! ## Overview
//! [`EnvelopeValidator::validate`] runs every check in a fixed order and
//! collects all issues instead of stopping at the first. Checks cover
//! required identity fields, format version, validity window, jurisdiction
//! consistency, enumerated tokens, effect allowances, budgets, evidence
//! requirements, escalation policy, and the attestation. The attestation
//! check recomputes the content hash and, when a verifier is configured,
//! verifies the signature. The validator never mutates its input.
//!
//! The content hash is `sha256:` over the RFC 8785 canonical JSON of every
//! envelope field except the attestation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::core::envelope::AutonomyEnvelope;
use crate::core::envelope::BlastRadius;
use crate::core::envelope::DataClassification;
use crate::core::envelope::DataHandlingRules;
use crate::core::envelope::EffectClass;
use crate::core::envelope::EffectClassAllowance;
use crate::core::envelope::EnvelopeBudgets;
use crate::core::envelope::EscalationAction;
use crate::core::envelope::EscalationMode;
use crate::core::envelope::EscalationPolicy;
use crate::core::envelope::EvidenceRequirement;
use crate::core::envelope::EvidenceTiming;
use crate::core::envelope::EvidenceType;
use crate::core::envelope::JudgmentClassification;
use crate::core::envelope::JurisdictionConstraint;
use crate::core::envelope::RedactionPolicy;
use crate::core::envelope::RegulatoryMode;
use crate::core::envelope::SUPPORTED_FORMAT_VERSION;
use crate::core::envelope::SigningAlgorithm;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashError;
use crate::core::hashing::canonical_json_bytes;
use crate::core::hashing::hash_canonical_json;
use crate::core::identifiers::EnvelopeId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;
use crate::interfaces::Clock;
use crate::interfaces::SignatureError;
use crate::interfaces::Signer;
use crate::interfaces::Verifier;
use crate::runtime::clock::SystemClock;

// ============================================================================
// SECTION: Validation Results
// ============================================================================

/// Validation issue codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    /// A required field is missing or empty.
    Required,
    /// The format version is not supported.
    UnsupportedFormat,
    /// The validity window is inverted or empty.
    InvalidWindow,
    /// The envelope is past `valid_until`.
    Expired,
    /// A value is outside its allowed set or range.
    InvalidValue,
    /// Two fields contradict each other.
    Conflict,
    /// A value appears more than once.
    Duplicate,
    /// The content hash could not be computed.
    HashError,
    /// The attested content hash does not match.
    HashMismatch,
    /// The attestation signature does not verify.
    SignatureInvalid,
}

impl ValidationCode {
    /// Returns the stable wire code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Required => "REQUIRED",
            Self::UnsupportedFormat => "UNSUPPORTED_FORMAT",
            Self::InvalidWindow => "INVALID_WINDOW",
            Self::Expired => "EXPIRED",
            Self::InvalidValue => "INVALID_VALUE",
            Self::Conflict => "CONFLICT",
            Self::Duplicate => "DUPLICATE",
            Self::HashError => "HASH_ERROR",
            Self::HashMismatch => "HASH_MISMATCH",
            Self::SignatureInvalid => "SIGNATURE_INVALID",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted field path, for example `budgets.tool_call_cap`.
    pub field: String,
    /// Issue code.
    pub code: ValidationCode,
    /// Human-readable message.
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.message, self.code)
    }
}

/// Outcome of validating an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True when no issue was found.
    pub valid: bool,
    /// Every issue found, in check order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationIssue>,
    /// Content hash, present only when valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl ValidationResult {
    /// Returns true when an issue with `code` was recorded.
    #[must_use]
    pub fn has_code(&self, code: ValidationCode) -> bool {
        self.errors.iter().any(|issue| issue.code == code)
    }
}

/// Issue accumulator used while validating.
#[derive(Default)]
struct Issues(Vec<ValidationIssue>);

impl Issues {
    /// Records one issue.
    fn push(&mut self, field: impl Into<String>, code: ValidationCode, message: impl Into<String>) {
        self.0.push(ValidationIssue {
            field: field.into(),
            code,
            message: message.into(),
        });
    }

    /// Records a `REQUIRED` issue when `value` is empty.
    fn require_non_empty(&mut self, field: &str, value: &str) {
        if value.is_empty() {
            self.push(field, ValidationCode::Required, format!("{field} is required"));
        }
    }

    /// Records an `INVALID_VALUE` issue when `known` is false.
    fn require_known(&mut self, field: impl Into<String>, known: bool, what: &str, value: &str) {
        if !known {
            self.push(field, ValidationCode::InvalidValue, format!("invalid {what} '{value}'"));
        }
    }
}

// ============================================================================
// SECTION: Content Hash
// ============================================================================

/// Borrowed view of every envelope field covered by the content hash.
#[derive(Serialize)]
struct HashableEnvelope<'a> {
    /// Envelope identifier.
    envelope_id: &'a EnvelopeId,
    /// Envelope version.
    version: &'a str,
    /// Schema format version.
    format_version: &'a str,
    /// Validity start.
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_from: Option<&'a Timestamp>,
    /// Validity end.
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_until: Option<&'a Timestamp>,
    /// Tenant scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant_id: Option<&'a TenantId>,
    /// Jurisdiction constraint.
    jurisdiction_scope: &'a JurisdictionConstraint,
    /// Data handling rules.
    data_handling: &'a DataHandlingRules,
    /// Effect allowances.
    allowed_effects: &'a [EffectClassAllowance],
    /// Budgets.
    budgets: &'a EnvelopeBudgets,
    /// Evidence requirements.
    required_evidence: &'a [EvidenceRequirement],
    /// Escalation policy.
    escalation_policy: &'a EscalationPolicy,
}

impl<'a> From<&'a AutonomyEnvelope> for HashableEnvelope<'a> {
    fn from(envelope: &'a AutonomyEnvelope) -> Self {
        Self {
            envelope_id: &envelope.envelope_id,
            version: &envelope.version,
            format_version: &envelope.format_version,
            valid_from: envelope.valid_from.as_ref(),
            valid_until: envelope.valid_until.as_ref(),
            tenant_id: envelope.tenant_id.as_ref(),
            jurisdiction_scope: &envelope.jurisdiction_scope,
            data_handling: &envelope.data_handling,
            allowed_effects: &envelope.allowed_effects,
            budgets: &envelope.budgets,
            required_evidence: &envelope.required_evidence,
            escalation_policy: &envelope.escalation_policy,
        }
    }
}

/// Computes the `sha256:` content hash of an envelope, excluding its attestation.
///
/// # Errors
///
/// Returns [`HashError`] when canonicalization fails.
pub fn compute_content_hash(envelope: &AutonomyEnvelope) -> Result<String, HashError> {
    let digest = hash_canonical_json(DEFAULT_HASH_ALGORITHM, &HashableEnvelope::from(envelope))?;
    Ok(digest.prefixed())
}

/// Canonical bytes an envelope signature covers.
///
/// # Errors
///
/// Returns [`HashError`] when canonicalization fails.
pub fn envelope_signing_payload(content_hash: &str) -> Result<Vec<u8>, HashError> {
    /// Signed envelope statement.
    #[derive(Serialize)]
    struct EnvelopePayload<'a> {
        /// Record kind tag.
        kind: &'static str,
        /// Attested content hash.
        content_hash: &'a str,
    }
    canonical_json_bytes(&EnvelopePayload {
        kind: "envelope",
        content_hash,
    })
}

/// Attests and signs an envelope in place.
///
/// Sets the content hash, signer, signing time, algorithm, and signature.
///
/// # Errors
///
/// Returns [`SignatureError`] when hashing or signing fails.
pub fn sign_envelope(
    envelope: &mut AutonomyEnvelope,
    signer: &dyn Signer,
    signed_at: Timestamp,
) -> Result<(), SignatureError> {
    let content_hash = compute_content_hash(envelope)?;
    let signature = signer.sign(&envelope_signing_payload(&content_hash)?)?;
    envelope.attestation.content_hash = content_hash;
    envelope.attestation.signer_id = Some(signer.key_id().to_string());
    envelope.attestation.signed_at = Some(signed_at);
    envelope.attestation.algorithm = Some(signer.algorithm().as_str().to_string());
    envelope.attestation.signature = Some(signature);
    Ok(())
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Envelope validator with an algorithm allowlist and injectable clock.
#[derive(Clone)]
pub struct EnvelopeValidator {
    /// Signing algorithms accepted on signed envelopes.
    allowed_algorithms: BTreeSet<SigningAlgorithm>,
    /// Time source for expiry checks.
    clock: Arc<dyn Clock>,
    /// Optional signature verifier.
    verifier: Option<Arc<dyn Verifier>>,
}

impl Default for EnvelopeValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeValidator {
    /// Creates a validator accepting every known algorithm on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allowed_algorithms: SigningAlgorithm::ALL.into_iter().collect(),
            clock: Arc::new(SystemClock),
            verifier: None,
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Restricts accepted signing algorithms.
    #[must_use]
    pub fn with_allowed_algorithms(
        mut self,
        algorithms: impl IntoIterator<Item = SigningAlgorithm>,
    ) -> Self {
        self.allowed_algorithms = algorithms.into_iter().collect();
        self
    }

    /// Verifies attestation signatures with `verifier`.
    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn Verifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Returns the validator clock.
    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Validates an envelope and returns every issue found.
    #[must_use]
    pub fn validate(&self, envelope: &AutonomyEnvelope) -> ValidationResult {
        let mut issues = Issues::default();

        issues.require_non_empty("envelope_id", envelope.envelope_id.as_str());
        issues.require_non_empty("version", &envelope.version);
        issues.require_non_empty("format_version", &envelope.format_version);
        if !envelope.format_version.is_empty()
            && envelope.format_version != SUPPORTED_FORMAT_VERSION
        {
            issues.push(
                "format_version",
                ValidationCode::UnsupportedFormat,
                format!(
                    "unsupported format version '{}', expected '{SUPPORTED_FORMAT_VERSION}'",
                    envelope.format_version
                ),
            );
        }

        self.check_window(&mut issues, envelope);
        check_jurisdiction(&mut issues, &envelope.jurisdiction_scope);
        check_data_handling(&mut issues, &envelope.data_handling);
        check_allowed_effects(&mut issues, &envelope.allowed_effects);
        check_budgets(&mut issues, &envelope.budgets);
        check_required_evidence(&mut issues, &envelope.required_evidence);
        check_escalation_policy(&mut issues, &envelope.escalation_policy);
        self.check_attestation(&mut issues, envelope);

        let errors = issues.0;
        let valid = errors.is_empty();
        let hash = if valid { compute_content_hash(envelope).ok() } else { None };
        ValidationResult {
            valid,
            errors,
            hash,
        }
    }

    /// Checks window ordering and expiry.
    fn check_window(&self, issues: &mut Issues, envelope: &AutonomyEnvelope) {
        if let (Some(from), Some(until)) = (envelope.valid_from, envelope.valid_until)
            && until <= from
        {
            issues.push(
                "valid_until",
                ValidationCode::InvalidWindow,
                "valid_until must be after valid_from",
            );
        }
        if let Some(until) = envelope.valid_until
            && until < self.clock.now()
        {
            issues.push("valid_until", ValidationCode::Expired, format!("envelope expired at {until}"));
        }
    }

    /// Checks the content hash, algorithm allowlist, and signature.
    fn check_attestation(&self, issues: &mut Issues, envelope: &AutonomyEnvelope) {
        let attestation = &envelope.attestation;
        if attestation.content_hash.is_empty() {
            issues.push(
                "attestation.content_hash",
                ValidationCode::Required,
                "content_hash is required",
            );
            return;
        }
        let computed = match compute_content_hash(envelope) {
            Ok(computed) => computed,
            Err(err) => {
                issues.push(
                    "attestation.content_hash",
                    ValidationCode::HashError,
                    format!("failed to compute content hash: {err}"),
                );
                return;
            }
        };
        if computed != attestation.content_hash {
            issues.push(
                "attestation.content_hash",
                ValidationCode::HashMismatch,
                "content_hash does not match computed hash, possible tamper",
            );
        }

        let Some(signature) = attestation.signature.as_deref().filter(|sig| !sig.is_empty()) else {
            return;
        };
        let algorithm = attestation.algorithm.as_deref().unwrap_or_default();
        let accepted = SigningAlgorithm::parse(algorithm)
            .is_some_and(|parsed| self.allowed_algorithms.contains(&parsed));
        if !accepted {
            issues.push(
                "attestation.algorithm",
                ValidationCode::InvalidValue,
                format!("unsupported signing algorithm '{algorithm}'"),
            );
            return;
        }
        let Some(verifier) = &self.verifier else {
            return;
        };
        let verified = envelope_signing_payload(&attestation.content_hash)
            .map_err(SignatureError::from)
            .and_then(|payload| verifier.verify(&payload, signature));
        match verified {
            Ok(true) => {}
            Ok(false) => issues.push(
                "attestation.signature",
                ValidationCode::SignatureInvalid,
                "signature does not verify against the content hash",
            ),
            Err(err) => issues.push(
                "attestation.signature",
                ValidationCode::SignatureInvalid,
                format!("signature could not be verified: {err}"),
            ),
        }
    }
}

// ============================================================================
// SECTION: Section Checks
// ============================================================================

/// Checks jurisdiction scope.
fn check_jurisdiction(issues: &mut Issues, scope: &JurisdictionConstraint) {
    if scope.allowed_jurisdictions.is_empty() {
        issues.push(
            "jurisdiction_scope.allowed_jurisdictions",
            ValidationCode::Required,
            "at least one allowed jurisdiction is required",
        );
    }
    issues.require_known(
        "jurisdiction_scope.regulatory_mode",
        RegulatoryMode::parse(&scope.regulatory_mode).is_some(),
        "regulatory mode",
        &scope.regulatory_mode,
    );
    for allowed in &scope.allowed_jurisdictions {
        if scope.prohibited_jurisdictions.contains(allowed) {
            issues.push(
                "jurisdiction_scope",
                ValidationCode::Conflict,
                format!("jurisdiction '{allowed}' is both allowed and prohibited"),
            );
        }
    }
}

/// Checks data handling tokens.
fn check_data_handling(issues: &mut Issues, rules: &DataHandlingRules) {
    issues.require_known(
        "data_handling.max_classification",
        DataClassification::parse(&rules.max_classification).is_some(),
        "data classification",
        &rules.max_classification,
    );
    issues.require_known(
        "data_handling.redaction_policy",
        RedactionPolicy::parse(&rules.redaction_policy).is_some(),
        "redaction policy",
        &rules.redaction_policy,
    );
}

/// Checks effect-class allowances.
fn check_allowed_effects(issues: &mut Issues, effects: &[EffectClassAllowance]) {
    if effects.is_empty() {
        issues.push(
            "allowed_effects",
            ValidationCode::Required,
            "at least one allowed effect class is required",
        );
        return;
    }
    let mut seen = BTreeSet::new();
    for (index, entry) in effects.iter().enumerate() {
        let field = format!("allowed_effects[{index}].effect_class");
        issues.require_known(
            field.clone(),
            EffectClass::parse(&entry.effect_class).is_some(),
            "effect class",
            &entry.effect_class,
        );
        if !seen.insert(entry.effect_class.as_str()) {
            issues.push(
                field,
                ValidationCode::Duplicate,
                format!("duplicate effect class '{}'", entry.effect_class),
            );
        }
        if entry.max_per_run < 0 {
            issues.push(
                format!("allowed_effects[{index}].max_per_run"),
                ValidationCode::InvalidValue,
                "max_per_run must be non-negative",
            );
        }
        if entry.requires_approval_above < 0 {
            issues.push(
                format!("allowed_effects[{index}].requires_approval_above"),
                ValidationCode::InvalidValue,
                "requires_approval_above must be non-negative",
            );
        }
    }
}

/// Checks budget ceilings, blast radius, and rate limits.
fn check_budgets(issues: &mut Issues, budgets: &EnvelopeBudgets) {
    let ceilings = [
        ("budgets.cost_ceiling_cents", budgets.cost_ceiling_cents),
        ("budgets.time_ceiling_seconds", budgets.time_ceiling_seconds),
        ("budgets.tool_call_cap", budgets.tool_call_cap),
    ];
    for (field, value) in ceilings {
        if value <= 0 {
            let name = field.trim_start_matches("budgets.");
            issues.push(field, ValidationCode::InvalidValue, format!("{name} must be positive"));
        }
    }
    if let Some(cap) = budgets.compute_units_cap
        && cap <= 0
    {
        issues.push(
            "budgets.compute_units_cap",
            ValidationCode::InvalidValue,
            "compute_units_cap must be positive",
        );
    }
    if let Some(radius) = budgets.blast_radius.as_deref() {
        issues.require_known(
            "budgets.blast_radius",
            BlastRadius::parse(radius).is_some(),
            "blast radius",
            radius,
        );
    }
    for (index, limit) in budgets.rate_limits.iter().enumerate() {
        if limit.resource.is_empty() {
            issues.push(
                format!("budgets.rate_limits[{index}].resource"),
                ValidationCode::Required,
                "resource is required",
            );
        }
        if limit.max_per_minute <= 0 {
            issues.push(
                format!("budgets.rate_limits[{index}].max_per_minute"),
                ValidationCode::InvalidValue,
                "max_per_minute must be positive",
            );
        }
    }
}

/// Checks evidence requirements.
fn check_required_evidence(issues: &mut Issues, requirements: &[EvidenceRequirement]) {
    for (index, requirement) in requirements.iter().enumerate() {
        if requirement.action_class.is_empty() {
            issues.push(
                format!("required_evidence[{index}].action_class"),
                ValidationCode::Required,
                "action_class is required",
            );
        }
        issues.require_known(
            format!("required_evidence[{index}].evidence_type"),
            EvidenceType::parse(&requirement.evidence_type).is_some(),
            "evidence type",
            &requirement.evidence_type,
        );
        issues.require_known(
            format!("required_evidence[{index}].when"),
            EvidenceTiming::parse(&requirement.when).is_some(),
            "when value",
            &requirement.when,
        );
    }
}

/// Checks the escalation policy.
fn check_escalation_policy(issues: &mut Issues, policy: &EscalationPolicy) {
    issues.require_known(
        "escalation_policy.default_mode",
        EscalationMode::parse(&policy.default_mode).is_some(),
        "default mode",
        &policy.default_mode,
    );
    for (index, trigger) in policy.escalation_triggers.iter().enumerate() {
        let prefix = format!("escalation_policy.escalation_triggers[{index}]");
        if trigger.condition.is_empty() {
            issues.push(
                format!("{prefix}.condition"),
                ValidationCode::Required,
                "condition is required",
            );
        }
        let action = EscalationAction::parse(&trigger.action);
        issues.require_known(
            format!("{prefix}.action"),
            action.is_some(),
            "escalation action",
            &trigger.action,
        );
        if action == Some(EscalationAction::RequireApproval) && trigger.quorum <= 0 {
            issues.push(
                format!("{prefix}.quorum"),
                ValidationCode::InvalidValue,
                "quorum must be positive when action is require_approval",
            );
        }
    }
    for (index, entry) in policy.judgment_taxonomy.iter().enumerate() {
        let prefix = format!("escalation_policy.judgment_taxonomy[{index}]");
        if entry.category.is_empty() {
            issues.push(
                format!("{prefix}.category"),
                ValidationCode::Required,
                "category is required",
            );
        }
        issues.require_known(
            format!("{prefix}.classification"),
            JudgmentClassification::parse(&entry.classification).is_some(),
            "classification",
            &entry.classification,
        );
    }
}
