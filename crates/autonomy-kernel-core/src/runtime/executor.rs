// crates/autonomy-kernel-core/src/runtime/executor.rs
// ============================================================================
// Module: Gated Executor
// Description: Authorization-checked, at-most-once effect execution pipeline.
// Purpose: Run one authorized effect and emit a signed, session-chained receipt.
// Dependencies: crate::{core, interfaces, runtime}, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`GatedExecutor::execute`] does not trust that an envelope gate ran. It
//! re-verifies the decision and intent signatures, the verdict, the intent
//! expiry, the policy phenotype, and the tool binding before dispatching.
//! Output is contract-checked, canonicalized, content-addressed, and bound
//! into a receipt that links to the previous receipt of the same session.
//!
//! Invariants:
//! - At most one receipt exists per decision; replays return the stored one.
//! - A receipt is never returned or stored unsigned.
//! - A failure before dispatch releases the outbox reservation.
//! - A failure after dispatch keeps the reservation scheduled and surfaces
//!   as a non-retryable [`ExecutionError::Unrecorded`].
//! - Only the call that stores a receipt audits the execution and meters it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::RwLock;

use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::core::custody::Artifact;
use crate::core::custody::AuthorizedExecutionIntent;
use crate::core::custody::DecisionRecord;
use crate::core::custody::EXECUTION_STATUS_SCHEMA;
use crate::core::custody::Effect;
use crate::core::custody::GENESIS_LAMPORT_CLOCK;
use crate::core::custody::GENESIS_PREV_HASH;
use crate::core::custody::Receipt;
use crate::core::custody::ReceiptStatus;
use crate::core::custody::VERDICT_PASS;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::canonical_json_bytes;
use crate::core::hashing::digests_match;
use crate::core::hashing::hash_bytes;
use crate::core::identifiers::DecisionId;
use crate::core::identifiers::SessionId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::ToolName;
use crate::core::time::Timestamp;
use crate::interfaces::ArtifactStore;
use crate::interfaces::AuditEvent;
use crate::interfaces::AuditSink;
use crate::interfaces::Clock;
use crate::interfaces::DriverError;
use crate::interfaces::OutboxError;
use crate::interfaces::OutboxStore;
use crate::interfaces::OutputSchemaRegistry;
use crate::interfaces::ReceiptInsert;
use crate::interfaces::ReceiptStore;
use crate::interfaces::ReceiptStoreError;
use crate::interfaces::Signer;
use crate::interfaces::ToolDriver;
use crate::interfaces::UsageEvent;
use crate::interfaces::UsageMeter;
use crate::interfaces::UsageMetric;
use crate::interfaces::Verifier;
use crate::runtime::audit::NoopAuditSink;
use crate::runtime::clock::SystemClock;
use crate::runtime::output::OutputContractError;
use crate::runtime::output::validate_and_canonicalize;
use crate::runtime::usage::NoopUsageMeter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Audit actor for executor events.
const AUDIT_ACTOR: &str = "executor";
/// Default tenant billed when a decision names none.
pub const DEFAULT_TENANT: &str = "system";
/// Content type for JSON output artifacts.
const JSON_CONTENT_TYPE: &str = "application/json";
/// Content type for plain text output artifacts.
const TEXT_CONTENT_TYPE: &str = "text/plain";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Execution failures, one per pipeline stage.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// No decision record was supplied.
    #[error("execution blocked: missing decision")]
    MissingDecision,
    /// No execution intent was supplied.
    #[error("execution blocked: missing execution intent")]
    MissingIntent,
    /// The intent authorizes a different decision.
    #[error("intent mismatch: intent.decision_id {intent_decision} != decision.id {decision}")]
    IntentMismatch {
        /// Decision named by the intent.
        intent_decision: DecisionId,
        /// Decision supplied.
        decision: DecisionId,
    },
    /// A signature is missing or does not verify.
    #[error("execution blocked: invalid {record} signature: {reason}")]
    InvalidSignature {
        /// Record kind (`decision` or `intent`).
        record: &'static str,
        /// Verification detail.
        reason: String,
    },
    /// The decision verdict is not `PASS`.
    #[error("execution blocked: decision verdict is {verdict} (reason: {reason})")]
    VerdictNotPass {
        /// Verdict found.
        verdict: String,
        /// Decision reason.
        reason: String,
    },
    /// The intent has expired.
    #[error("execution blocked: intent expired at {expires_at}")]
    IntentExpired {
        /// Intent expiry.
        expires_at: Timestamp,
    },
    /// The policy phenotype does not match.
    #[error("execution blocked: phenotype mismatch (expected {expected}, found {actual})")]
    PhenotypeMismatch {
        /// Expected hash.
        expected: String,
        /// Hash found.
        actual: String,
    },
    /// Neither the effect nor the intent names a tool.
    #[error("tool_name missing in params and intent names no tool")]
    ToolUnresolved,
    /// The requested tool is not the one the intent authorizes.
    #[error("intent violation: allowed_tool '{allowed}' does not match requested '{requested}'")]
    ToolNotAuthorized {
        /// Tool authorized by the intent.
        allowed: ToolName,
        /// Tool requested by the effect.
        requested: ToolName,
    },
    /// The tool is on the prohibited list.
    #[error("policy violation: tool '{0}' is prohibited")]
    ToolProhibited(ToolName),
    /// The outbox failed.
    #[error("failed to schedule effect in outbox: {0}")]
    Outbox(String),
    /// Another execution of the same decision is in flight.
    #[error("decision {0} is already being executed")]
    DuplicateInFlight(DecisionId),
    /// The tool driver failed.
    #[error(transparent)]
    Driver(#[from] DriverError),
    /// The output drifted from its pinned contract.
    #[error("connector contract drift: {0}")]
    SchemaDrift(#[from] OutputContractError),
    /// The output could not be canonicalized.
    #[error("output canonicalization failed: {0}")]
    Canonicalization(String),
    /// Content-addressed storage failed.
    #[error("failed to persist artifact: {0}")]
    Storage(String),
    /// Content-addressed storage returned a different digest.
    #[error("store integrity violation: computed {computed} != stored {stored}")]
    StorageIntegrity {
        /// Locally computed digest.
        computed: String,
        /// Digest returned by the store.
        stored: String,
    },
    /// Receipt signing failed.
    #[error("fail-closed: receipt signing failed: {0}")]
    Signing(String),
    /// The session receipt chain has no Lamport clock values left.
    #[error("session {session} receipt chain exhausted: lamport clock overflow")]
    LamportOverflow {
        /// Session whose chain is exhausted.
        session: SessionId,
    },
    /// Receipt storage failed.
    #[error(transparent)]
    ReceiptStore(#[from] ReceiptStoreError),
    /// The tool ran but its output or receipt could not be recorded. The
    /// outbox reservation is left scheduled and the call must not be retried.
    #[error("effect for decision {decision} dispatched but not recorded: {source}")]
    Unrecorded {
        /// Decision whose effect ran.
        decision: DecisionId,
        /// Failure that stopped recording.
        source: Box<ExecutionError>,
    },
}

impl ExecutionError {
    /// Returns true for transient failures worth retrying. Failures after
    /// the tool has been dispatched are never retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Driver(DriverError::Unavailable(_))
                | Self::Storage(_)
                | Self::Outbox(_)
                | Self::DuplicateInFlight(_)
                | Self::ReceiptStore(ReceiptStoreError::Io(_))
        )
    }
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Effect executor that re-verifies authorization before every dispatch.
pub struct GatedExecutor {
    /// Verifier for decisions and intents.
    verifier: Arc<dyn Verifier>,
    /// Signer for receipts.
    signer: Arc<dyn Signer>,
    /// Tool driver.
    driver: Arc<dyn ToolDriver>,
    /// Receipt store.
    receipts: Arc<dyn ReceiptStore>,
    /// Content-addressed output store.
    artifacts: Arc<dyn ArtifactStore>,
    /// Optional outbox.
    outbox: Option<Arc<dyn OutboxStore>>,
    /// Optional output contract registry.
    output_schemas: Option<Arc<dyn OutputSchemaRegistry>>,
    /// Audit trail.
    audit: Arc<dyn AuditSink>,
    /// Usage meter.
    meter: Arc<dyn UsageMeter>,
    /// Time source.
    clock: Arc<dyn Clock>,
    /// Active policy phenotype hash.
    active_phenotype_hash: Option<String>,
    /// Tenant billed when a decision names none.
    default_tenant: TenantId,
    /// Tools refused regardless of authorization.
    prohibited_tools: RwLock<BTreeSet<ToolName>>,
}

impl GatedExecutor {
    /// Creates an executor with no outbox, no output contracts, no-op audit
    /// and metering, and the system clock.
    #[must_use]
    pub fn new(
        verifier: Arc<dyn Verifier>,
        signer: Arc<dyn Signer>,
        driver: Arc<dyn ToolDriver>,
        receipts: Arc<dyn ReceiptStore>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            verifier,
            signer,
            driver,
            receipts,
            artifacts,
            outbox: None,
            output_schemas: None,
            audit: Arc::new(NoopAuditSink),
            meter: Arc::new(NoopUsageMeter),
            clock: Arc::new(SystemClock),
            active_phenotype_hash: None,
            default_tenant: TenantId::new(DEFAULT_TENANT),
            prohibited_tools: RwLock::new(BTreeSet::new()),
        }
    }

    /// Reserves each decision in `outbox` before dispatch.
    #[must_use]
    pub fn with_outbox(mut self, outbox: Arc<dyn OutboxStore>) -> Self {
        self.outbox = Some(outbox);
        self
    }

    /// Checks tool output against pinned contracts from `registry`.
    #[must_use]
    pub fn with_output_schemas(mut self, registry: Arc<dyn OutputSchemaRegistry>) -> Self {
        self.output_schemas = Some(registry);
        self
    }

    /// Sends audit events to `audit`.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Records usage in `meter`.
    #[must_use]
    pub fn with_meter(mut self, meter: Arc<dyn UsageMeter>) -> Self {
        self.meter = meter;
        self
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Pins the active policy phenotype hash.
    #[must_use]
    pub fn with_active_phenotype_hash(mut self, hash: impl Into<String>) -> Self {
        self.active_phenotype_hash = Some(hash.into());
        self
    }

    /// Sets the tenant billed when a decision names none.
    #[must_use]
    pub fn with_default_tenant(mut self, tenant: TenantId) -> Self {
        self.default_tenant = tenant;
        self
    }

    /// Replaces the prohibited tool list.
    pub fn apply_tool_policy(&self, prohibited: impl IntoIterator<Item = ToolName>) {
        let mut guard =
            self.prohibited_tools.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = prohibited.into_iter().collect();
    }

    /// Returns the prohibited tool list.
    #[must_use]
    pub fn prohibited_tools(&self) -> Vec<ToolName> {
        let guard = self.prohibited_tools.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.iter().cloned().collect()
    }

    /// Executes an effect under a decision and intent.
    ///
    /// A decision that already has a receipt is not dispatched again; the
    /// stored receipt is returned with a status artifact.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError`] naming the first stage that failed. Once
    /// the tool has run, failures are wrapped in [`ExecutionError::Unrecorded`].
    pub fn execute(
        &self,
        effect: &Effect,
        decision: Option<&DecisionRecord>,
        intent: Option<&AuthorizedExecutionIntent>,
    ) -> Result<(Receipt, Artifact), ExecutionError> {
        let Some(decision) = decision else {
            return Err(ExecutionError::MissingDecision);
        };
        if let Some(existing) = self.receipts.get(&decision.id)? {
            return Ok(replayed(existing));
        }

        let intent = self.verify_authorization(decision, intent)?;
        let blob_hash = self.verify_phenotype(decision)?;
        let tool = resolve_tool(effect, intent)?;
        if self.is_prohibited(&tool) {
            return Err(ExecutionError::ToolProhibited(tool));
        }

        if let Some(outbox) = &self.outbox {
            outbox.schedule(effect, decision).map_err(|err| match err {
                OutboxError::AlreadyScheduled(_) => {
                    ExecutionError::DuplicateInFlight(decision.id.clone())
                }
                other => ExecutionError::Outbox(other.to_string()),
            })?;
        }
        let output = match self.driver.execute(&tool, &effect.params) {
            Ok(output) => output,
            Err(err) => {
                self.release_reservation(decision);
                return Err(err.into());
            }
        };

        match self.record(effect, decision, &tool, blob_hash, &output) {
            Ok(Recorded::Inserted(receipt, artifact)) => {
                self.finalize(decision, &tool, &receipt);
                Ok((receipt, artifact))
            }
            Ok(Recorded::Existing(existing)) => {
                self.complete_reservation(decision);
                Ok(replayed(existing))
            }
            Err(err) => {
                // The tool already ran: the reservation stays scheduled so the
                // entry remains visible to reconciliation.
                self.audit_event(
                    "unrecorded_execution",
                    json!({
                        "decision_id": decision.id,
                        "tool": tool,
                        "error": err.to_string(),
                    }),
                );
                Err(ExecutionError::Unrecorded {
                    decision: decision.id.clone(),
                    source: Box::new(err),
                })
            }
        }
    }

    /// Verifies presence, binding, signatures, verdict, and expiry.
    fn verify_authorization<'a>(
        &self,
        decision: &DecisionRecord,
        intent: Option<&'a AuthorizedExecutionIntent>,
    ) -> Result<&'a AuthorizedExecutionIntent, ExecutionError> {
        let Some(intent) = intent else {
            return Err(ExecutionError::MissingIntent);
        };
        if intent.decision_id != decision.id {
            return Err(ExecutionError::IntentMismatch {
                intent_decision: intent.decision_id.clone(),
                decision: decision.id.clone(),
            });
        }
        check_signature("decision", self.verifier.verify_decision(decision))?;
        check_signature("intent", self.verifier.verify_intent(intent))?;
        if decision.verdict != VERDICT_PASS {
            return Err(ExecutionError::VerdictNotPass {
                verdict: decision.verdict.clone(),
                reason: decision.reason.clone(),
            });
        }
        if self.clock.now() > intent.expires_at {
            return Err(ExecutionError::IntentExpired {
                expires_at: intent.expires_at,
            });
        }
        Ok(intent)
    }

    /// Content-addresses the decision snapshot and checks phenotype hashes.
    ///
    /// Returns the snapshot blob address when a snapshot is present.
    fn verify_phenotype(&self, decision: &DecisionRecord) -> Result<Option<String>, ExecutionError> {
        let declared = decision.phenotype_hash.as_deref().unwrap_or_default();
        let mut blob_hash = None;
        if let Some(snapshot) = decision.snapshot.as_deref().filter(|snapshot| !snapshot.is_empty()) {
            let stored = self
                .artifacts
                .store(snapshot.as_bytes())
                .map_err(|err| ExecutionError::Storage(format!("snapshot: {err}")))?;
            if !digests_match(&stored, declared) {
                return Err(ExecutionError::PhenotypeMismatch {
                    expected: declared.to_string(),
                    actual: stored,
                });
            }
            blob_hash = Some(stored);
        }
        if let Some(active) = &self.active_phenotype_hash
            && !digests_match(active, declared)
        {
            return Err(ExecutionError::PhenotypeMismatch {
                expected: active.clone(),
                actual: declared.to_string(),
            });
        }
        Ok(blob_hash)
    }

    /// Returns true when the tool is prohibited.
    fn is_prohibited(&self, tool: &ToolName) -> bool {
        let guard = self.prohibited_tools.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.contains(tool)
    }

    /// Stores dispatched output and a signed receipt.
    fn record(
        &self,
        effect: &Effect,
        decision: &DecisionRecord,
        tool: &ToolName,
        blob_hash: Option<String>,
        output: &Value,
    ) -> Result<Recorded, ExecutionError> {
        let schema = self.output_schemas.as_ref().and_then(|registry| registry.lookup_output(tool));
        let artifact = match schema {
            Some(schema) => {
                let canonical = validate_and_canonicalize(Some(&schema), output)?;
                json_artifact(canonical.canonical_bytes, canonical.output_hash)
            }
            None => canonicalize_output(output)?,
        };
        let stored = self
            .artifacts
            .store(&artifact.canonical_bytes)
            .map_err(|err| ExecutionError::Storage(err.to_string()))?;
        if !digests_match(&stored, &artifact.digest) {
            self.audit_event(
                "storage_integrity",
                json!({
                    "decision_id": decision.id,
                    "computed": artifact.digest,
                    "stored": stored,
                }),
            );
            return Err(ExecutionError::StorageIntegrity {
                computed: artifact.digest,
                stored,
            });
        }

        let receipt = self.build_receipt(effect, decision, blob_hash, &artifact.digest)?;
        match self.receipts.insert_if_absent(&receipt)? {
            ReceiptInsert::Inserted => Ok(Recorded::Inserted(receipt, artifact)),
            ReceiptInsert::Existing(existing) => {
                self.audit_event(
                    "duplicate_execution",
                    json!({
                        "decision_id": decision.id,
                        "receipt_id": existing.receipt_id,
                        "tool": tool,
                    }),
                );
                Ok(Recorded::Existing(*existing))
            }
        }
    }

    /// Builds and signs the session-chained receipt.
    fn build_receipt(
        &self,
        effect: &Effect,
        decision: &DecisionRecord,
        blob_hash: Option<String>,
        output_hash: &str,
    ) -> Result<Receipt, ExecutionError> {
        let session_id = decision.session_id();
        let previous = match &session_id {
            Some(session) => {
                self.receipts.last_for_session(session)?.map(|prev| (session.clone(), prev))
            }
            None => None,
        };
        let (prev_hash, lamport_clock) = match previous {
            Some((session, prev)) => {
                let next = prev.lamport_clock.checked_add(1).ok_or(
                    ExecutionError::LamportOverflow {
                        session,
                    },
                )?;
                (prev.signature, next)
            }
            None => (GENESIS_PREV_HASH.to_string(), GENESIS_LAMPORT_CLOCK),
        };
        let mut receipt = Receipt {
            receipt_id: Receipt::id_for(&decision.id),
            decision_id: decision.id.clone(),
            effect_id: effect.effect_id.clone(),
            session_id,
            status: ReceiptStatus::Success,
            blob_hash,
            output_hash: output_hash.to_string(),
            args_hash: effect.args_hash.clone(),
            timestamp: self.clock.now(),
            prev_hash,
            lamport_clock,
            signature: String::new(),
        };
        self.signer
            .sign_receipt(&mut receipt)
            .map_err(|err| ExecutionError::Signing(err.to_string()))?;
        if receipt.signature.is_empty() {
            return Err(ExecutionError::Signing("signer produced an empty signature".to_string()));
        }
        Ok(receipt)
    }

    /// Marks the outbox entry done, audits, and meters. Failures here never
    /// undo a stored receipt.
    fn finalize(&self, decision: &DecisionRecord, tool: &ToolName, receipt: &Receipt) {
        self.complete_reservation(decision);
        self.audit_event(
            "execute_effect",
            json!({
                "decision_id": decision.id,
                "receipt_id": receipt.receipt_id,
                "tool": tool,
                "status": receipt.status,
                "lamport_clock": receipt.lamport_clock,
            }),
        );
        let usage = UsageEvent {
            tenant_id: decision.tenant_id().unwrap_or_else(|| self.default_tenant.clone()),
            metric: UsageMetric::Execution,
            units: 1,
            decision_id: decision.id.clone(),
            tool: tool.clone(),
            timestamp: self.clock.now(),
        };
        if let Err(err) = self.meter.record(&usage) {
            self.audit_event(
                "metering_error",
                json!({ "decision_id": decision.id, "error": err.to_string() }),
            );
        }
    }

    /// Marks the outbox entry for a recorded decision done.
    fn complete_reservation(&self, decision: &DecisionRecord) {
        if let Some(outbox) = &self.outbox
            && let Err(err) = outbox.mark_done(&decision.id)
        {
            self.audit_event(
                "outbox_error",
                json!({ "decision_id": decision.id, "op": "mark_done", "error": err.to_string() }),
            );
        }
    }

    /// Releases the outbox entry of a decision whose tool never ran.
    fn release_reservation(&self, decision: &DecisionRecord) {
        if let Some(outbox) = &self.outbox
            && let Err(err) = outbox.release(&decision.id)
        {
            self.audit_event(
                "outbox_error",
                json!({ "decision_id": decision.id, "op": "release", "error": err.to_string() }),
            );
        }
    }

    /// Appends an executor audit event. Sink failures are not propagated.
    fn audit_event(&self, action: &str, payload: Value) {
        let _ = self.audit.append(&AuditEvent::new(self.clock.now(), AUDIT_ACTOR, action, payload));
    }
}

/// Outcome of recording a dispatched effect.
enum Recorded {
    /// This call stored the receipt.
    Inserted(Receipt, Artifact),
    /// A concurrent writer stored a receipt first.
    Existing(Receipt),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a verification outcome onto [`ExecutionError::InvalidSignature`].
fn check_signature(
    record: &'static str,
    outcome: Result<bool, crate::interfaces::SignatureError>,
) -> Result<(), ExecutionError> {
    match outcome {
        Ok(true) => Ok(()),
        Ok(false) => Err(ExecutionError::InvalidSignature {
            record,
            reason: "signature does not verify".to_string(),
        }),
        Err(err) => Err(ExecutionError::InvalidSignature {
            record,
            reason: err.to_string(),
        }),
    }
}

/// Resolves the tool from the effect, falling back to the intent.
fn resolve_tool(
    effect: &Effect,
    intent: &AuthorizedExecutionIntent,
) -> Result<ToolName, ExecutionError> {
    let allowed = intent.allowed_tool.as_ref().filter(|tool| !tool.is_empty());
    let requested = effect.requested_tool().filter(|tool| !tool.is_empty());
    match (requested, allowed) {
        (Some(requested), Some(allowed)) if &requested != allowed => {
            Err(ExecutionError::ToolNotAuthorized {
                allowed: allowed.clone(),
                requested,
            })
        }
        (Some(requested), _) => Ok(requested),
        (None, Some(allowed)) => Ok(allowed.clone()),
        (None, None) => Err(ExecutionError::ToolUnresolved),
    }
}

/// Canonicalizes raw output into an addressed artifact.
///
/// Strings are stored as UTF-8 text; every other value as canonical JSON.
fn canonicalize_output(output: &Value) -> Result<Artifact, ExecutionError> {
    match output {
        Value::String(text) => {
            let canonical_bytes = text.as_bytes().to_vec();
            let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, &canonical_bytes).prefixed();
            Ok(addressed_artifact(TEXT_CONTENT_TYPE, canonical_bytes, digest))
        }
        other => {
            let canonical_bytes = canonical_json_bytes(other)
                .map_err(|err| ExecutionError::Canonicalization(err.to_string()))?;
            let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, &canonical_bytes).prefixed();
            Ok(json_artifact(canonical_bytes, digest))
        }
    }
}

/// Wraps canonical JSON bytes and their digest as an artifact.
fn json_artifact(canonical_bytes: Vec<u8>, digest: String) -> Artifact {
    addressed_artifact(JSON_CONTENT_TYPE, canonical_bytes, digest)
}

/// Builds an artifact from canonical bytes and their digest.
fn addressed_artifact(content_type: &str, canonical_bytes: Vec<u8>, digest: String) -> Artifact {
    Artifact {
        schema_id: content_type.to_string(),
        content_type: content_type.to_string(),
        digest,
        canonical_bytes,
        preview: None,
    }
}

/// Builds the replay result for an already-executed decision.
fn replayed(receipt: Receipt) -> (Receipt, Artifact) {
    let artifact = Artifact {
        schema_id: EXECUTION_STATUS_SCHEMA.to_string(),
        content_type: JSON_CONTENT_TYPE.to_string(),
        digest: receipt.output_hash.clone(),
        canonical_bytes: Vec::new(),
        preview: Some(format!("Already executed. Receipt: {}", receipt.receipt_id)),
    };
    (receipt, artifact)
}
