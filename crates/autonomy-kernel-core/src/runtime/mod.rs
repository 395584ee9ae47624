// crates/autonomy-kernel-core/src/runtime/mod.rs
// ============================================================================
// Module: Autonomy Kernel Runtime
// Description: Envelope validation, gating, monitoring, and gated execution.
// Purpose: Enforce autonomy envelopes and record signed proof of every effect.
// Dependencies: crate::{core, interfaces}, ed25519-dalek, jsonschema
// ============================================================================

//! ## Overview
//! Runtime modules implement the kernel's enforcement path: the envelope
//! validator, the fail-closed envelope gate, the envelope monitor, and the
//! gated executor with its receipt chain. In-memory and file-backed
//! implementations of the kernel interfaces live here as well.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod audit;
pub mod chain;
pub mod clock;
pub mod executor;
pub mod gate;
pub mod monitor;
pub mod output;
pub mod signer;
pub mod store;
pub mod usage;
pub mod validator;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileAuditSink;
pub use audit::InMemoryAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use chain::ChainIssue;
pub use chain::ChainReport;
pub use chain::verify_receipt_chain;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use executor::ExecutionError;
pub use executor::GatedExecutor;
pub use gate::EnvelopeGate;
pub use monitor::EnvelopeMonitor;
pub use monitor::MonitorError;
pub use monitor::MonitorViolation;
pub use monitor::MonitorViolationKind;
pub use monitor::MonitoredEnvelope;
pub use output::InMemoryOutputSchemaRegistry;
pub use output::OutputContractError;
pub use output::OutputErrorCode;
pub use output::validate_and_canonicalize;
pub use signer::Ed25519Signer;
pub use signer::Ed25519Verifier;
pub use store::FileArtifactStore;
pub use store::InMemoryArtifactStore;
pub use store::InMemoryOutboxStore;
pub use store::InMemoryReceiptStore;
pub use usage::InMemoryUsageMeter;
pub use usage::NoopUsageMeter;
pub use validator::EnvelopeValidator;
pub use validator::ValidationCode;
pub use validator::ValidationIssue;
pub use validator::ValidationResult;
pub use validator::compute_content_hash;
pub use validator::sign_envelope;
