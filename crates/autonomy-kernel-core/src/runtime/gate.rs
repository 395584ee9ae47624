// crates/autonomy-kernel-core/src/runtime/gate.rs
// ============================================================================
// Module: Envelope Gate
// Description: Fail-closed runtime enforcement of one bound autonomy envelope.
// Purpose: Admit or deny effect requests against envelope scope and budgets.
// Dependencies: crate::{core, interfaces, runtime::validator}
// ============================================================================

//! ## Overview
//! An [`EnvelopeGate`] is either unbound (every effect is denied) or bound to
//! one validated envelope. [`EnvelopeGate::check_effect`] runs an ordered
//! sequence of checks under the gate lock and returns on the first failure.
//! Counters are only updated once every check has passed, so a denied
//! request (including an escalation routing denial) never consumes budget.
//!
//! Security posture: requests are untrusted. Unknown classification or
//! blast-radius tokens deny rather than default.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::admission::EffectRequest;
use crate::core::admission::GateDecision;
use crate::core::admission::GateSnapshot;
use crate::core::admission::GateViolation;
use crate::core::envelope::AutonomyEnvelope;
use crate::core::envelope::BlastRadius;
use crate::core::envelope::DataClassification;
use crate::core::identifiers::EnvelopeId;
use crate::core::time::Timestamp;
use crate::interfaces::Clock;
use crate::runtime::validator::EnvelopeValidator;
use crate::runtime::validator::ValidationResult;

// ============================================================================
// SECTION: Runtime State
// ============================================================================

/// Lock-guarded gate state.
#[derive(Debug, Default)]
struct GateRuntimeState {
    /// Bound envelope and bind instant.
    active: Option<BoundEnvelope>,
    /// Admitted tool calls.
    tool_call_count: i64,
    /// Accumulated admitted cost.
    cost_accumulated: i64,
    /// Admitted count per effect class.
    effect_counts: BTreeMap<String, i64>,
}

/// An envelope bound into the gate.
#[derive(Debug)]
struct BoundEnvelope {
    /// Envelope contract.
    envelope: AutonomyEnvelope,
    /// Bind instant.
    started_at: Timestamp,
}

impl GateRuntimeState {
    /// Clears counters and installs `active`.
    fn reset(&mut self, active: Option<BoundEnvelope>) {
        self.active = active;
        self.tool_call_count = 0;
        self.cost_accumulated = 0;
        self.effect_counts.clear();
    }
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Fail-closed enforcement gate for one autonomy envelope at a time.
pub struct EnvelopeGate {
    /// Runtime state; every read and write holds this lock.
    state: Mutex<GateRuntimeState>,
    /// Validator used on bind.
    validator: EnvelopeValidator,
    /// Time source shared with the validator.
    clock: Arc<dyn Clock>,
}

impl Default for EnvelopeGate {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeGate {
    /// Creates an unbound gate with a default validator on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_validator(EnvelopeValidator::new())
    }

    /// Creates an unbound gate sharing the validator's clock.
    #[must_use]
    pub fn with_validator(validator: EnvelopeValidator) -> Self {
        let clock = validator.clock();
        Self {
            state: Mutex::new(GateRuntimeState::default()),
            validator,
            clock,
        }
    }

    /// Creates an unbound gate whose gate and validator both use `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::with_validator(EnvelopeValidator::new().with_clock(clock))
    }

    /// Acquires the state lock, recovering the guard if a holder panicked.
    ///
    /// Every mutation completes before the lock is released, so a poisoned
    /// guard still holds consistent counters.
    fn lock(&self) -> MutexGuard<'_, GateRuntimeState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Validates and binds an envelope, resetting every counter.
    ///
    /// On validation failure the gate is left unbound and the issues are
    /// returned.
    pub fn bind(&self, envelope: &AutonomyEnvelope) -> ValidationResult {
        let result = self.validator.validate(envelope);
        let mut state = self.lock();
        if result.valid {
            state.reset(Some(BoundEnvelope {
                envelope: envelope.clone(),
                started_at: self.clock.now(),
            }));
        } else {
            state.reset(None);
        }
        result
    }

    /// Unbinds the envelope, returning the gate to fail-closed.
    pub fn unbind(&self) {
        self.lock().reset(None);
    }

    /// Returns true when an envelope is bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.lock().active.is_some()
    }

    /// Returns the bound envelope identifier and version.
    #[must_use]
    pub fn active_envelope(&self) -> Option<(EnvelopeId, String)> {
        self.lock().active.as_ref().map(|bound| {
            (bound.envelope.envelope_id.clone(), bound.envelope.version.clone())
        })
    }

    /// Checks one effect request and, on admission, records its usage.
    #[must_use]
    pub fn check_effect(&self, request: &EffectRequest) -> GateDecision {
        let mut state = self.lock();
        let Some(bound) = state.active.as_ref() else {
            return GateDecision::deny(
                GateViolation::NoEnvelope,
                "no active autonomy envelope bound",
            );
        };
        let envelope = &bound.envelope;
        let now = self.clock.now();

        if let Some(until) = envelope.valid_until
            && now > until
        {
            return GateDecision::deny(
                GateViolation::EnvelopeExpired,
                "autonomy envelope has expired",
            );
        }

        if !request.jurisdiction.is_empty() && !jurisdiction_allowed(envelope, &request.jurisdiction)
        {
            return GateDecision::deny(
                GateViolation::JurisdictionDenied,
                format!("jurisdiction '{}' not allowed by envelope", request.jurisdiction),
            );
        }

        let Some((max_per_run, approval_above)) = effect_limits(envelope, request) else {
            return GateDecision::deny(
                GateViolation::EffectClassDenied,
                format!("effect class '{}' not allowed by envelope", request.effect_class),
            );
        };

        let current = state.effect_counts.get(&request.effect_class).copied().unwrap_or(0);
        if max_per_run > 0 && current >= max_per_run {
            return GateDecision::deny(
                GateViolation::EffectCountExceeded,
                format!(
                    "effect class '{}' exceeded max_per_run ({max_per_run})",
                    request.effect_class
                ),
            );
        }
        if approval_above > 0 && current >= approval_above {
            return GateDecision::escalate(format!(
                "effect class '{}' requires approval (count {current} reached threshold \
                 {approval_above})",
                request.effect_class
            ));
        }

        if !request.data_class.is_empty()
            && !data_class_allowed(&envelope.data_handling.max_classification, &request.data_class)
        {
            return GateDecision::deny(
                GateViolation::DataClassificationExceeded,
                format!(
                    "data classification '{}' exceeds max '{}'",
                    request.data_class, envelope.data_handling.max_classification
                ),
            );
        }

        let ceiling = envelope.budgets.cost_ceiling_cents;
        if request.estimated_cost < 0 {
            return GateDecision::deny(
                GateViolation::CostCeilingExceeded,
                format!("estimated cost {} must not be negative", request.estimated_cost),
            );
        }
        let Some(new_cost) = state.cost_accumulated.checked_add(request.estimated_cost) else {
            return GateDecision::deny(GateViolation::CostCeilingExceeded, "cost accumulation overflow");
        };
        if request.estimated_cost > 0 && new_cost > ceiling {
            return GateDecision::deny(
                GateViolation::CostCeilingExceeded,
                format!("cost would exceed ceiling ({new_cost} > {ceiling} cents)"),
            );
        }

        let new_tool_calls = state.tool_call_count.saturating_add(1);
        if new_tool_calls > envelope.budgets.tool_call_cap {
            return GateDecision::deny(
                GateViolation::ToolCallCapExceeded,
                format!(
                    "tool call cap exceeded ({new_tool_calls} > {})",
                    envelope.budgets.tool_call_cap
                ),
            );
        }

        let elapsed = now.seconds_since(bound.started_at);
        let time_ceiling = envelope.budgets.time_ceiling_seconds;
        #[allow(clippy::cast_precision_loss, reason = "ceilings are far below 2^52 seconds")]
        let time_ceiling_f64 = time_ceiling as f64;
        if elapsed > time_ceiling_f64 {
            return GateDecision::deny(
                GateViolation::TimeCeilingExceeded,
                format!("time ceiling exceeded ({elapsed:.0}s > {time_ceiling}s)"),
            );
        }

        if !request.blast_radius.is_empty()
            && let Some(max_radius) = envelope.budgets.blast_radius.as_deref()
            && !max_radius.is_empty()
            && !blast_radius_allowed(max_radius, &request.blast_radius)
        {
            return GateDecision::deny(
                GateViolation::BlastRadiusExceeded,
                format!("blast radius '{}' exceeds max '{max_radius}'", request.blast_radius),
            );
        }

        state.tool_call_count = new_tool_calls;
        state.cost_accumulated = new_cost;
        let count = state.effect_counts.entry(request.effect_class.clone()).or_insert(0);
        *count = count.saturating_add(1);
        GateDecision::allow()
    }

    /// Returns a copy of the counters, or `None` when unbound.
    ///
    /// Snapshots are for observability only; admission never reads them.
    #[must_use]
    pub fn snapshot(&self) -> Option<GateSnapshot> {
        let state = self.lock();
        let bound = state.active.as_ref()?;
        Some(GateSnapshot {
            envelope_id: bound.envelope.envelope_id.clone(),
            envelope_version: bound.envelope.version.clone(),
            tool_call_count: state.tool_call_count,
            cost_accumulated: state.cost_accumulated,
            effect_counts: state.effect_counts.clone(),
            elapsed_seconds: self.clock.now().seconds_since(bound.started_at),
        })
    }
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Returns true when the jurisdiction is allowed and not prohibited.
fn jurisdiction_allowed(envelope: &AutonomyEnvelope, jurisdiction: &str) -> bool {
    let scope = &envelope.jurisdiction_scope;
    if scope.prohibited_jurisdictions.iter().any(|code| code == jurisdiction) {
        return false;
    }
    scope.allowed_jurisdictions.iter().any(|code| code == jurisdiction)
}

/// Returns `(max_per_run, requires_approval_above)` when the class and type are allowed.
fn effect_limits(envelope: &AutonomyEnvelope, request: &EffectRequest) -> Option<(i64, i64)> {
    let allowance = envelope.allowance(&request.effect_class)?;
    if !allowance.allowed {
        return None;
    }
    if !allowance.allowed_types.is_empty()
        && !request.effect_type.is_empty()
        && !allowance.allowed_types.iter().any(|kind| kind == &request.effect_type)
    {
        return None;
    }
    Some((allowance.max_per_run, allowance.requires_approval_above))
}

/// Returns true when `requested` does not exceed `max`; unknown tokens deny.
fn data_class_allowed(max: &str, requested: &str) -> bool {
    match (DataClassification::parse(max), DataClassification::parse(requested)) {
        (Some(max), Some(requested)) => requested <= max,
        _ => false,
    }
}

/// Returns true when `requested` does not exceed `max`; unknown tokens deny.
fn blast_radius_allowed(max: &str, requested: &str) -> bool {
    match (BlastRadius::parse(max), BlastRadius::parse(requested)) {
        (Some(max), Some(requested)) => requested <= max,
        _ => false,
    }
}
