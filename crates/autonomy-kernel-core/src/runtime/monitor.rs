// crates/autonomy-kernel-core/src/runtime/monitor.rs
// ============================================================================
// Module: Envelope Monitor
// Description: Continuous expiry and budget monitoring across envelopes.
// Purpose: Auto-pause envelopes that expire or overrun their budget.
// Dependencies: crate::{core, interfaces}, serde, thiserror
// ============================================================================

//! ## Overview
//! The monitor tracks many envelopes at once. Usage is recorded in minor
//! currency units; an overrun or a sweep that finds an expired envelope
//! records a numbered [`MonitorViolation`], deactivates the envelope, and
//! invokes the optional pause callback. The callback runs after the monitor
//! lock is released so it may call back into the monitor.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::envelope::AutonomyEnvelope;
use crate::core::identifiers::EnvelopeId;
use crate::core::time::Timestamp;
use crate::interfaces::Clock;
use crate::runtime::clock::SystemClock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Monitor violation categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitorViolationKind {
    /// The envelope passed `valid_until`.
    Expired,
    /// Recorded usage passed the budget.
    BudgetExceeded,
}

/// A detected envelope violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorViolation {
    /// Sequential identifier, `viol-N`.
    pub violation_id: String,
    /// Affected envelope.
    pub envelope_id: EnvelopeId,
    /// Violation category.
    #[serde(rename = "type")]
    pub kind: MonitorViolationKind,
    /// Human-readable description.
    pub description: String,
    /// Detection instant.
    pub detected_at: Timestamp,
    /// Whether the envelope was paused.
    pub auto_paused: bool,
}

/// An envelope under continuous monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredEnvelope {
    /// Envelope identifier.
    pub envelope_id: EnvelopeId,
    /// Expiry instant, if any.
    pub valid_until: Option<Timestamp>,
    /// Budget in minor currency units.
    pub budget_max_cents: i64,
    /// Usage recorded so far.
    pub budget_used_cents: i64,
    /// Whether the envelope is active.
    pub active: bool,
}

impl MonitoredEnvelope {
    /// Builds a monitoring record from an envelope's cost ceiling and expiry.
    #[must_use]
    pub fn from_envelope(envelope: &AutonomyEnvelope) -> Self {
        Self {
            envelope_id: envelope.envelope_id.clone(),
            valid_until: envelope.valid_until,
            budget_max_cents: envelope.budgets.cost_ceiling_cents,
            budget_used_cents: 0,
            active: true,
        }
    }
}

/// Monitor errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MonitorError {
    /// The envelope is not being watched.
    #[error("envelope {0} not monitored")]
    NotMonitored(EnvelopeId),
    /// Usage passed the budget and the envelope was paused.
    #[error("budget exceeded for envelope {0}")]
    BudgetExceeded(EnvelopeId),
}

/// Pause callback receiving the envelope and reason.
pub type PauseCallback = Arc<dyn Fn(&EnvelopeId, &str) + Send + Sync>;

/// Lock-guarded monitor state.
#[derive(Default)]
struct MonitorState {
    /// Watched envelopes by id.
    envelopes: BTreeMap<EnvelopeId, MonitoredEnvelope>,
    /// Every recorded violation.
    violations: Vec<MonitorViolation>,
    /// Last violation sequence number.
    sequence: u64,
}

impl MonitorState {
    /// Records a violation and deactivates the envelope.
    fn record_violation(
        &mut self,
        envelope_id: &EnvelopeId,
        kind: MonitorViolationKind,
        description: String,
        now: Timestamp,
    ) -> MonitorViolation {
        self.sequence += 1;
        let violation = MonitorViolation {
            violation_id: format!("viol-{}", self.sequence),
            envelope_id: envelope_id.clone(),
            kind,
            description,
            detected_at: now,
            auto_paused: true,
        };
        self.violations.push(violation.clone());
        if let Some(envelope) = self.envelopes.get_mut(envelope_id) {
            envelope.active = false;
        }
        violation
    }
}

// ============================================================================
// SECTION: Monitor
// ============================================================================

/// Continuous envelope monitor.
pub struct EnvelopeMonitor {
    /// Monitor state.
    state: Mutex<MonitorState>,
    /// Pause callback.
    on_pause: Mutex<Option<PauseCallback>>,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl Default for EnvelopeMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeMonitor {
    /// Creates a monitor on the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a monitor on `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(MonitorState::default()),
            on_pause: Mutex::new(None),
            clock,
        }
    }

    /// Acquires the monitor state.
    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Installs the callback invoked whenever an envelope is auto-paused.
    pub fn on_pause(&self, callback: PauseCallback) {
        let mut guard = self.on_pause.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Some(callback);
    }

    /// Starts watching an envelope, marking it active.
    pub fn watch(&self, mut envelope: MonitoredEnvelope) {
        envelope.active = true;
        self.lock().envelopes.insert(envelope.envelope_id.clone(), envelope);
    }

    /// Adds usage to an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::NotMonitored`] for unknown envelopes and
    /// [`MonitorError::BudgetExceeded`] when usage passes the budget.
    pub fn record_usage(&self, envelope_id: &EnvelopeId, cost_cents: i64) -> Result<(), MonitorError> {
        let now = self.clock.now();
        let violation = {
            let mut state = self.lock();
            let Some(envelope) = state.envelopes.get_mut(envelope_id) else {
                return Err(MonitorError::NotMonitored(envelope_id.clone()));
            };
            envelope.budget_used_cents = envelope.budget_used_cents.saturating_add(cost_cents);
            if envelope.budget_used_cents <= envelope.budget_max_cents {
                return Ok(());
            }
            let description = format!(
                "budget {} > max {}",
                envelope.budget_used_cents, envelope.budget_max_cents
            );
            state.record_violation(envelope_id, MonitorViolationKind::BudgetExceeded, description, now)
        };
        self.notify(std::slice::from_ref(&violation));
        Err(MonitorError::BudgetExceeded(envelope_id.clone()))
    }

    /// Sweeps active envelopes for expiry and budget overruns.
    ///
    /// Returns the violations found by this sweep.
    pub fn check(&self) -> Vec<MonitorViolation> {
        let now = self.clock.now();
        let found = {
            let mut state = self.lock();
            let mut pending = Vec::new();
            for envelope in state.envelopes.values().filter(|envelope| envelope.active) {
                if envelope.valid_until.is_some_and(|until| now > until) {
                    pending.push((
                        envelope.envelope_id.clone(),
                        MonitorViolationKind::Expired,
                        "envelope expired".to_string(),
                    ));
                }
                if envelope.budget_used_cents > envelope.budget_max_cents {
                    pending.push((
                        envelope.envelope_id.clone(),
                        MonitorViolationKind::BudgetExceeded,
                        format!(
                            "budget {} > max {}",
                            envelope.budget_used_cents, envelope.budget_max_cents
                        ),
                    ));
                }
            }
            pending
                .into_iter()
                .map(|(id, kind, description)| state.record_violation(&id, kind, description, now))
                .collect::<Vec<_>>()
        };
        self.notify(&found);
        found
    }

    /// Returns true when the envelope is watched and active.
    #[must_use]
    pub fn is_active(&self, envelope_id: &EnvelopeId) -> bool {
        self.lock().envelopes.get(envelope_id).is_some_and(|envelope| envelope.active)
    }

    /// Returns every recorded violation.
    #[must_use]
    pub fn violations(&self) -> Vec<MonitorViolation> {
        self.lock().violations.clone()
    }

    /// Invokes the pause callback for each violation outside the state lock.
    fn notify(&self, violations: &[MonitorViolation]) {
        let callback =
            self.on_pause.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone();
        if let Some(callback) = callback {
            for violation in violations {
                callback(&violation.envelope_id, &violation.description);
            }
        }
    }
}
