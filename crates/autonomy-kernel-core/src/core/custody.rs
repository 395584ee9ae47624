// crates/autonomy-kernel-core/src/core/custody.rs
// ============================================================================
// Module: Chain of Custody Records
// Description: Effects, decisions, execution intents, receipts, and artifacts.
// Purpose: Define the signed records that authorize and prove one executed action.
// Dependencies: serde, serde_json, crate::core::{hashing, identifiers, time}
// ============================================================================

//! ## Overview
//! One executed action leaves four linked records:
//! - an [`Effect`] describing what should happen,
//! - a [`DecisionRecord`] signed by a policy authority,
//! - an [`AuthorizedExecutionIntent`] binding that decision to one tool until
//!   an expiry,
//! - a [`Receipt`] proving execution, chained per session through
//!   `prev_hash` and `lamport_clock`.
//!
//! Field names are stable wire contracts consumed by auditors and replay
//! tooling. Signing payloads are RFC 8785 canonical JSON objects tagged with
//! a `kind`, so a signature over one record kind never verifies as another.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::core::hashing::HashError;
use crate::core::hashing::canonical_json_bytes;
use crate::core::identifiers::DecisionId;
use crate::core::identifiers::EffectId;
use crate::core::identifiers::IntentId;
use crate::core::identifiers::ReceiptId;
use crate::core::identifiers::SessionId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::ToolName;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Verdict that authorizes execution.
pub const VERDICT_PASS: &str = "PASS";
/// `prev_hash` value of the first receipt in a session.
pub const GENESIS_PREV_HASH: &str = "GENESIS";
/// Lamport clock value of the first receipt in a session.
pub const GENESIS_LAMPORT_CLOCK: u64 = 1;
/// Effect parameter naming the tool to dispatch.
pub const TOOL_NAME_PARAM: &str = "tool_name";
/// Decision context key carrying the session identifier.
pub const SESSION_CONTEXT_KEY: &str = "session_id";
/// Decision context key carrying the tenant identifier.
pub const TENANT_CONTEXT_KEY: &str = "tenant_id";

// ============================================================================
// SECTION: Effect
// ============================================================================

/// A single proposed side-effecting action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    /// Effect identifier.
    pub effect_id: EffectId,
    /// Tool parameters; `tool_name` selects the tool when present.
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Hash of the canonical tool arguments, bound into the receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args_hash: Option<String>,
    /// Hash of the canonical tool output, set after dispatch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_hash: Option<String>,
}

impl Effect {
    /// Returns the tool named in the effect parameters, if any.
    #[must_use]
    pub fn requested_tool(&self) -> Option<ToolName> {
        self.params.get(TOOL_NAME_PARAM).and_then(Value::as_str).map(ToolName::from)
    }
}

// ============================================================================
// SECTION: Decision Record
// ============================================================================

/// Signed policy verdict authorizing (or refusing) an effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// Decision identifier; also the execution idempotency key.
    pub id: DecisionId,
    /// `sha256:` hash of the policy configuration the decision was made under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phenotype_hash: Option<String>,
    /// Serialized policy configuration snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<String>,
    /// Verdict token (`PASS`, `FAIL`, `WARN`, `PENDING`).
    pub verdict: String,
    /// Human-readable reason.
    #[serde(default)]
    pub reason: String,
    /// Decision input context (session and tenant live here).
    #[serde(default)]
    pub input_context: Map<String, Value>,
    /// Hex-encoded signature.
    #[serde(default)]
    pub signature: String,
    /// Signature type, for example `ed25519:<key id>`.
    #[serde(default)]
    pub signature_type: String,
    /// Decision time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

impl DecisionRecord {
    /// Returns the session named in the input context, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        context_string(&self.input_context, SESSION_CONTEXT_KEY).map(SessionId::from)
    }

    /// Returns the tenant named in the input context, if any.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        context_string(&self.input_context, TENANT_CONTEXT_KEY).map(TenantId::from)
    }

    /// Returns canonical bytes covered by the decision signature.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when canonicalization fails.
    pub fn signing_payload(&self) -> Result<Vec<u8>, HashError> {
        canonical_json_bytes(&DecisionPayload {
            kind: "decision",
            id: &self.id,
            verdict: &self.verdict,
            reason: &self.reason,
            phenotype_hash: self.phenotype_hash.as_deref(),
        })
    }
}

/// Signed view of a decision.
#[derive(Serialize)]
struct DecisionPayload<'a> {
    /// Record kind tag.
    kind: &'static str,
    /// Decision identifier.
    id: &'a DecisionId,
    /// Verdict token.
    verdict: &'a str,
    /// Reason text.
    reason: &'a str,
    /// Declared phenotype hash.
    #[serde(skip_serializing_if = "Option::is_none")]
    phenotype_hash: Option<&'a str>,
}

/// Reads a non-empty string from a context map.
fn context_string<'a>(context: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    context.get(key).and_then(Value::as_str).filter(|value| !value.is_empty())
}

// ============================================================================
// SECTION: Execution Intent
// ============================================================================

/// Signed, time-bounded authorization binding one decision to one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedExecutionIntent {
    /// Intent identifier.
    pub id: IntentId,
    /// Decision this intent authorizes.
    pub decision_id: DecisionId,
    /// Hash of the effect digest the intent was issued for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_digest_hash: Option<String>,
    /// Caller-supplied idempotency key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    /// Issue time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<Timestamp>,
    /// Expiry; execution after this instant is refused.
    pub expires_at: Timestamp,
    /// Issuing authority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<String>,
    /// Hex-encoded signature.
    #[serde(default)]
    pub signature: String,
    /// The single tool this intent authorizes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_tool: Option<ToolName>,
}

impl AuthorizedExecutionIntent {
    /// Returns canonical bytes covered by the intent signature.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when canonicalization fails.
    pub fn signing_payload(&self) -> Result<Vec<u8>, HashError> {
        canonical_json_bytes(&IntentPayload {
            kind: "intent",
            id: &self.id,
            decision_id: &self.decision_id,
            allowed_tool: self.allowed_tool.as_ref(),
            expires_at: &self.expires_at,
            effect_digest_hash: self.effect_digest_hash.as_deref(),
        })
    }
}

/// Signed view of an intent.
#[derive(Serialize)]
struct IntentPayload<'a> {
    /// Record kind tag.
    kind: &'static str,
    /// Intent identifier.
    id: &'a IntentId,
    /// Bound decision identifier.
    decision_id: &'a DecisionId,
    /// Authorized tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_tool: Option<&'a ToolName>,
    /// Expiry.
    expires_at: &'a Timestamp,
    /// Effect digest hash.
    #[serde(skip_serializing_if = "Option::is_none")]
    effect_digest_hash: Option<&'a str>,
}

// ============================================================================
// SECTION: Receipt
// ============================================================================

/// Execution outcome recorded on a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptStatus {
    /// The effect executed and its output was persisted.
    Success,
}

/// Terminal, signed proof that an effect executed.
///
/// # Invariants
/// - Never persisted or returned with an empty `signature`.
/// - Within one session, `lamport_clock` strictly increases and `prev_hash`
///   equals the previous receipt's signature (`GENESIS` for the first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Receipt identifier (`rcpt-<decision id>`).
    pub receipt_id: ReceiptId,
    /// Decision that authorized execution.
    pub decision_id: DecisionId,
    /// Executed effect.
    pub effect_id: EffectId,
    /// Session scoping the causal chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    /// Execution status.
    pub status: ReceiptStatus,
    /// Content address of the policy snapshot, if one was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_hash: Option<String>,
    /// Content address of the canonical tool output.
    pub output_hash: String,
    /// Hash of the canonical tool arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args_hash: Option<String>,
    /// Issue time.
    pub timestamp: Timestamp,
    /// Signature of the previous receipt in the session, or `GENESIS`.
    pub prev_hash: String,
    /// Per-session logical clock.
    pub lamport_clock: u64,
    /// Hex-encoded signature over all other fields.
    #[serde(default)]
    pub signature: String,
}

impl Receipt {
    /// Builds the receipt identifier for a decision.
    #[must_use]
    pub fn id_for(decision_id: &DecisionId) -> ReceiptId {
        ReceiptId::new(format!("rcpt-{decision_id}"))
    }

    /// Returns canonical bytes covered by the receipt signature.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] when canonicalization fails.
    pub fn signing_payload(&self) -> Result<Vec<u8>, HashError> {
        canonical_json_bytes(&ReceiptPayload {
            kind: "receipt",
            receipt_id: &self.receipt_id,
            decision_id: &self.decision_id,
            effect_id: &self.effect_id,
            session_id: self.session_id.as_ref(),
            status: self.status,
            blob_hash: self.blob_hash.as_deref(),
            output_hash: &self.output_hash,
            args_hash: self.args_hash.as_deref(),
            timestamp: &self.timestamp,
            prev_hash: &self.prev_hash,
            lamport_clock: self.lamport_clock,
        })
    }
}

/// Signed view of a receipt.
#[derive(Serialize)]
struct ReceiptPayload<'a> {
    /// Record kind tag.
    kind: &'static str,
    /// Receipt identifier.
    receipt_id: &'a ReceiptId,
    /// Decision identifier.
    decision_id: &'a DecisionId,
    /// Effect identifier.
    effect_id: &'a EffectId,
    /// Session identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a SessionId>,
    /// Status.
    status: ReceiptStatus,
    /// Snapshot content address.
    #[serde(skip_serializing_if = "Option::is_none")]
    blob_hash: Option<&'a str>,
    /// Output content address.
    output_hash: &'a str,
    /// Arguments hash.
    #[serde(skip_serializing_if = "Option::is_none")]
    args_hash: Option<&'a str>,
    /// Issue time.
    timestamp: &'a Timestamp,
    /// Causal link.
    prev_hash: &'a str,
    /// Logical clock.
    lamport_clock: u64,
}

// ============================================================================
// SECTION: Artifact
// ============================================================================

/// Schema identifier of the synthetic artifact returned on idempotent replay.
pub const EXECUTION_STATUS_SCHEMA: &str = "system/execution-status";

/// Canonicalized tool output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Schema identifier of the content.
    pub schema_id: String,
    /// MIME content type.
    pub content_type: String,
    /// `sha256:` content address of `canonical_bytes`.
    pub digest: String,
    /// Canonical bytes; empty for synthetic artifacts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub canonical_bytes: Vec<u8>,
    /// Short human-readable preview.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}
