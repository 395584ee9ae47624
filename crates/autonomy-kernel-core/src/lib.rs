// crates/autonomy-kernel-core/src/lib.rs
// ============================================================================
// Module: Autonomy Kernel Core Library
// Description: Public API surface for the autonomy governance kernel.
// Purpose: Expose core types, interfaces, and runtime enforcement.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The autonomy kernel bounds what an agent may do. An autonomy envelope
//! declares scope, budgets, and expiry; the envelope gate admits or denies
//! each proposed effect against it; the gated executor re-verifies the signed
//! authorization before dispatch and emits a signed receipt chained to the
//! session's previous receipt. Merkle evidence trees support selective
//! disclosure of the resulting records.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ArtifactStore;
pub use interfaces::ArtifactStoreError;
pub use interfaces::AuditEvent;
pub use interfaces::AuditSink;
pub use interfaces::Clock;
pub use interfaces::DriverError;
pub use interfaces::OutboxError;
pub use interfaces::OutboxStore;
pub use interfaces::OutputSchemaRegistry;
pub use interfaces::ReceiptInsert;
pub use interfaces::ReceiptStore;
pub use interfaces::ReceiptStoreError;
pub use interfaces::SignatureError;
pub use interfaces::Signer;
pub use interfaces::ToolDriver;
pub use interfaces::UsageEvent;
pub use interfaces::UsageMeter;
pub use interfaces::Verifier;
pub use runtime::ChainReport;
pub use runtime::EnvelopeGate;
pub use runtime::EnvelopeMonitor;
pub use runtime::EnvelopeValidator;
pub use runtime::ExecutionError;
pub use runtime::GatedExecutor;
pub use runtime::ValidationResult;
pub use runtime::verify_receipt_chain;
