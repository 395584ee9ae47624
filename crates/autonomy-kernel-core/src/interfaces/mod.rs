// crates/autonomy-kernel-core/src/interfaces/mod.rs
// ============================================================================
// Module: Autonomy Kernel Interfaces
// Description: Collaborator contracts for signing, storage, dispatch, and audit.
// Purpose: Define the seams through which the kernel reaches external systems.
// Dependencies: crate::core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The kernel owns no transport or persistence. Every external capability
//! (clocks, signers, receipt/outbox/artifact stores, tool drivers, audit
//! trails, metering, output schema registries) is reached through a trait
//! defined here and injected at construction time. Implementations must be
//! safe for concurrent use and fail closed on missing or invalid data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::core::custody::AuthorizedExecutionIntent;
use crate::core::custody::DecisionRecord;
use crate::core::custody::Effect;
use crate::core::custody::Receipt;
use crate::core::envelope::SigningAlgorithm;
use crate::core::hashing::HashError;
use crate::core::identifiers::DecisionId;
use crate::core::identifiers::EffectId;
use crate::core::identifiers::SessionId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::ToolName;
use crate::core::output_schema::OutputSchema;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

// ============================================================================
// SECTION: Signing
// ============================================================================

/// Signing and verification errors.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The record carries no signature.
    #[error("missing signature")]
    MissingSignature,
    /// A key or signature is malformed.
    #[error("signature encoding error: {0}")]
    Encoding(String),
    /// The signing payload could not be built.
    #[error("signing payload error: {0}")]
    Payload(String),
    /// The signer failed.
    #[error("signing failed: {0}")]
    Signing(String),
}

impl From<HashError> for SignatureError {
    fn from(error: HashError) -> Self {
        Self::Payload(error.to_string())
    }
}

/// Produces signatures over canonical record payloads.
pub trait Signer: Send + Sync {
    /// Returns the signing key identifier.
    fn key_id(&self) -> &str;

    /// Returns the signing algorithm.
    fn algorithm(&self) -> SigningAlgorithm;

    /// Signs raw payload bytes and returns a lowercase hex signature.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Signing`] when the key cannot sign.
    fn sign(&self, payload: &[u8]) -> Result<String, SignatureError>;

    /// Signs a decision record in place and sets its signature type.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] when the payload or signature fails.
    fn sign_decision(&self, decision: &mut DecisionRecord) -> Result<(), SignatureError> {
        let payload = decision.signing_payload()?;
        decision.signature = self.sign(&payload)?;
        decision.signature_type =
            format!("{}:{}", self.algorithm().as_str().to_ascii_lowercase(), self.key_id());
        Ok(())
    }

    /// Signs an execution intent in place.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] when the payload or signature fails.
    fn sign_intent(&self, intent: &mut AuthorizedExecutionIntent) -> Result<(), SignatureError> {
        let payload = intent.signing_payload()?;
        intent.signature = self.sign(&payload)?;
        Ok(())
    }

    /// Signs a receipt in place.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] when the payload or signature fails.
    fn sign_receipt(&self, receipt: &mut Receipt) -> Result<(), SignatureError> {
        let payload = receipt.signing_payload()?;
        receipt.signature = self.sign(&payload)?;
        Ok(())
    }
}

/// Verifies signatures over canonical record payloads.
pub trait Verifier: Send + Sync {
    /// Verifies a hex signature over raw payload bytes.
    ///
    /// Returns `Ok(false)` when the signature does not match.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Encoding`] when the signature is malformed.
    fn verify(&self, payload: &[u8], signature: &str) -> Result<bool, SignatureError>;

    /// Verifies a decision record signature.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::MissingSignature`] for unsigned records.
    fn verify_decision(&self, decision: &DecisionRecord) -> Result<bool, SignatureError> {
        if decision.signature.is_empty() {
            return Err(SignatureError::MissingSignature);
        }
        self.verify(&decision.signing_payload()?, &decision.signature)
    }

    /// Verifies an execution intent signature.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::MissingSignature`] for unsigned records.
    fn verify_intent(&self, intent: &AuthorizedExecutionIntent) -> Result<bool, SignatureError> {
        if intent.signature.is_empty() {
            return Err(SignatureError::MissingSignature);
        }
        self.verify(&intent.signing_payload()?, &intent.signature)
    }

    /// Verifies a receipt signature.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::MissingSignature`] for unsigned records.
    fn verify_receipt(&self, receipt: &Receipt) -> Result<bool, SignatureError> {
        if receipt.signature.is_empty() {
            return Err(SignatureError::MissingSignature);
        }
        self.verify(&receipt.signing_payload()?, &receipt.signature)
    }
}

// ============================================================================
// SECTION: Receipt Store
// ============================================================================

/// Receipt store errors.
#[derive(Debug, Error)]
pub enum ReceiptStoreError {
    /// Store I/O error.
    #[error("receipt store io error: {0}")]
    Io(String),
    /// Stored data fails integrity checks.
    #[error("receipt store corruption: {0}")]
    Corrupt(String),
    /// Stored data version is incompatible.
    #[error("receipt store version mismatch: {0}")]
    VersionMismatch(String),
    /// An unsigned receipt was offered for storage.
    #[error("receipt store rejected unsigned receipt {0}")]
    Unsigned(String),
    /// Store reported an error.
    #[error("receipt store error: {0}")]
    Store(String),
}

/// Outcome of an atomic insert-if-absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptInsert {
    /// The receipt was stored.
    Inserted,
    /// A receipt for the same decision already existed and is returned.
    Existing(Box<Receipt>),
}

/// Durable receipt storage keyed by decision identifier.
pub trait ReceiptStore: Send + Sync {
    /// Loads the receipt for a decision.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptStoreError`] when loading fails.
    fn get(&self, decision_id: &DecisionId) -> Result<Option<Receipt>, ReceiptStoreError>;

    /// Stores a signed receipt unless one exists for the same decision.
    ///
    /// The existence check and the write are a single atomic step.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptStoreError::Unsigned`] for unsigned receipts and
    /// [`ReceiptStoreError`] when storage fails.
    fn insert_if_absent(&self, receipt: &Receipt) -> Result<ReceiptInsert, ReceiptStoreError>;

    /// Returns the receipt with the highest lamport clock in a session.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptStoreError`] when loading fails.
    fn last_for_session(&self, session_id: &SessionId)
    -> Result<Option<Receipt>, ReceiptStoreError>;
}

// ============================================================================
// SECTION: Outbox Store
// ============================================================================

/// Outbox errors.
#[derive(Debug, Error)]
pub enum OutboxError {
    /// The decision already has an in-flight reservation.
    #[error("decision {0} is already scheduled")]
    AlreadyScheduled(String),
    /// The decision is not in the outbox.
    #[error("decision {0} is not scheduled")]
    NotScheduled(String),
    /// Outbox storage failed.
    #[error("outbox store error: {0}")]
    Store(String),
}

/// Outbox entry status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    /// Reserved and awaiting completion.
    Scheduled,
    /// Completed with a stored receipt.
    Done,
}

/// One outbox entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEntry {
    /// Decision identifier.
    pub decision_id: DecisionId,
    /// Effect identifier.
    pub effect_id: EffectId,
    /// Entry status.
    pub status: OutboxStatus,
}

/// Transactional outbox reserving a decision for dispatch.
pub trait OutboxStore: Send + Sync {
    /// Atomically reserves a decision for dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxError::AlreadyScheduled`] when the decision is
    /// already reserved or done.
    fn schedule(&self, effect: &Effect, decision: &DecisionRecord) -> Result<(), OutboxError>;

    /// Marks a reserved decision as done.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxError::NotScheduled`] for unknown decisions.
    fn mark_done(&self, decision_id: &DecisionId) -> Result<(), OutboxError>;

    /// Releases a reservation after a failed execution so it may be retried.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxError`] when storage fails.
    fn release(&self, decision_id: &DecisionId) -> Result<(), OutboxError>;

    /// Lists entries still awaiting completion.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxError`] when storage fails.
    fn pending(&self) -> Result<Vec<OutboxEntry>, OutboxError>;
}

// ============================================================================
// SECTION: Artifact Store
// ============================================================================

/// Artifact store errors.
#[derive(Debug, Error)]
pub enum ArtifactStoreError {
    /// Store I/O error.
    #[error("artifact store io error: {0}")]
    Io(String),
    /// Stored bytes no longer match their address.
    #[error("artifact store corruption: {0}")]
    Corrupt(String),
    /// The digest is malformed.
    #[error("artifact store invalid digest: {0}")]
    InvalidDigest(String),
}

/// Content-addressed blob storage keyed by `sha256:` digests.
pub trait ArtifactStore: Send + Sync {
    /// Stores bytes and returns their `sha256:` address. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError`] when writing fails.
    fn store(&self, bytes: &[u8]) -> Result<String, ArtifactStoreError>;

    /// Loads bytes by address.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError`] when reading fails or bytes are corrupt.
    fn get(&self, digest: &str) -> Result<Option<Vec<u8>>, ArtifactStoreError>;

    /// Returns true when the address is present.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError`] when the lookup fails.
    fn exists(&self, digest: &str) -> Result<bool, ArtifactStoreError>;
}

// ============================================================================
// SECTION: Tool Driver
// ============================================================================

/// Tool driver errors.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The driver does not know the tool.
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    /// The tool failed.
    #[error("tool execution failed: {0}")]
    Failed(String),
    /// The tool failed transiently and may be retried.
    #[error("tool temporarily unavailable: {0}")]
    Unavailable(String),
}

/// Executes a named tool with parameters.
pub trait ToolDriver: Send + Sync {
    /// Runs the tool and returns its raw JSON output.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] when the tool fails.
    fn execute(&self, tool: &ToolName, params: &Map<String, Value>) -> Result<Value, DriverError>;
}

/// Supplies pinned output contracts per tool.
pub trait OutputSchemaRegistry: Send + Sync {
    /// Returns the pinned contract for a tool, if any.
    fn lookup_output(&self, tool: &ToolName) -> Option<OutputSchema>;
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit trail errors.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The event could not be serialized.
    #[error("audit serialization error: {0}")]
    Serialization(String),
    /// The sink failed to write.
    #[error("audit sink io error: {0}")]
    Io(String),
}

/// One audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event family label.
    pub event: String,
    /// Event time in unix milliseconds.
    pub timestamp_ms: i128,
    /// Component that acted.
    pub actor: String,
    /// Action label, for example `execute_effect`.
    pub action: String,
    /// Structured details.
    pub payload: Value,
}

impl AuditEvent {
    /// Event family label for kernel audit entries.
    pub const KERNEL_EVENT: &'static str = "kernel_audit";

    /// Builds a kernel audit event.
    #[must_use]
    pub fn new(at: Timestamp, actor: &str, action: &str, payload: Value) -> Self {
        Self {
            event: Self::KERNEL_EVENT.to_string(),
            timestamp_ms: at.unix_millis(),
            actor: actor.to_string(),
            action: action.to_string(),
            payload,
        }
    }
}

/// Append-only audit trail.
pub trait AuditSink: Send + Sync {
    /// Appends an event.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError`] when the event cannot be written.
    fn append(&self, event: &AuditEvent) -> Result<(), AuditError>;
}

// ============================================================================
// SECTION: Metering
// ============================================================================

/// Usage metering errors.
#[derive(Debug, Error)]
pub enum UsageError {
    /// The meter rejected or failed to record usage.
    #[error("usage metering error: {0}")]
    Meter(String),
}

/// Usage metric identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageMetric {
    /// One executed effect.
    Execution,
}

/// Usage record emitted after a successful execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEvent {
    /// Billed tenant.
    pub tenant_id: TenantId,
    /// Metric being recorded.
    pub metric: UsageMetric,
    /// Units consumed.
    pub units: u64,
    /// Decision that was executed.
    pub decision_id: DecisionId,
    /// Tool that ran.
    pub tool: ToolName,
    /// Record time.
    pub timestamp: Timestamp,
}

/// Usage metering sink.
pub trait UsageMeter: Send + Sync {
    /// Records usage.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError`] when recording fails.
    fn record(&self, event: &UsageEvent) -> Result<(), UsageError>;
}
