// crates/autonomy-kernel-core/src/core/mod.rs
// ============================================================================
// Module: Autonomy Kernel Core Types
// Description: Canonical envelope, custody, admission, and evidence structures.
// Purpose: Provide stable, serializable types shared by every kernel surface.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! Core types define the autonomy envelope contract, the chain-of-custody
//! records for executed effects, gate admission values, and Merkle evidence
//! primitives. Field names here are persisted by stores and read by external
//! auditors, so they are treated as wire contracts.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod admission;
pub mod custody;
pub mod envelope;
pub mod hashing;
pub mod identifiers;
pub mod merkle;
pub mod output_schema;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use admission::EffectRequest;
pub use admission::GateDecision;
pub use admission::GateSnapshot;
pub use admission::GateViolation;
pub use custody::Artifact;
pub use custody::AuthorizedExecutionIntent;
pub use custody::DecisionRecord;
pub use custody::Effect;
pub use custody::GENESIS_PREV_HASH;
pub use custody::Receipt;
pub use custody::ReceiptStatus;
pub use custody::VERDICT_PASS;
pub use envelope::AutonomyEnvelope;
pub use envelope::BlastRadius;
pub use envelope::DataClassification;
pub use envelope::EffectClass;
pub use envelope::SigningAlgorithm;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use identifiers::DecisionId;
pub use identifiers::EffectId;
pub use identifiers::EnvelopeId;
pub use identifiers::IntentId;
pub use identifiers::ReceiptId;
pub use identifiers::SessionId;
pub use identifiers::TenantId;
pub use identifiers::ToolName;
pub use merkle::EvidenceView;
pub use merkle::MerkleBuilder;
pub use merkle::MerkleError;
pub use merkle::MerkleProof;
pub use merkle::MerkleTree;
pub use output_schema::OutputSchema;
pub use output_schema::ToolOutputSchema;
pub use time::Timestamp;
