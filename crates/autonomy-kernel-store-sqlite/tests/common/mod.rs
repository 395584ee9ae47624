// crates/autonomy-kernel-store-sqlite/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared fixtures for SQLite kernel store tests.
// Purpose: Provide temporary stores, signed receipts, and signed decisions.
// Dependencies: autonomy-kernel-core, autonomy-kernel-store-sqlite, tempfile
// ============================================================================

//! ## Overview
//! Fixtures open a store inside a temporary directory and produce receipts
//! and decisions signed with a deterministic Ed25519 key.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    dead_code,
    reason = "Test-only helpers; not every test binary uses every fixture."
)]

use std::path::Path;
use std::path::PathBuf;

use autonomy_kernel_core::AuthorizedExecutionIntent;
use autonomy_kernel_core::DecisionId;
use autonomy_kernel_core::DecisionRecord;
use autonomy_kernel_core::Effect;
use autonomy_kernel_core::EffectId;
use autonomy_kernel_core::GENESIS_PREV_HASH;
use autonomy_kernel_core::IntentId;
use autonomy_kernel_core::Receipt;
use autonomy_kernel_core::ReceiptStatus;
use autonomy_kernel_core::SessionId;
use autonomy_kernel_core::Signer;
use autonomy_kernel_core::Timestamp;
use autonomy_kernel_core::ToolName;
use autonomy_kernel_core::VERDICT_PASS;
use autonomy_kernel_core::runtime::Ed25519Signer;
use autonomy_kernel_store_sqlite::SqliteKernelStore;
use autonomy_kernel_store_sqlite::SqliteStoreConfig;
use serde_json::Map;
use serde_json::json;
use tempfile::TempDir;

/// Fixed test epoch (2026-01-01T00:00:00Z).
pub const EPOCH_SECONDS: i64 = 1_767_225_600;

/// Returns the fixed test epoch.
pub fn epoch() -> Timestamp {
    Timestamp::from_unix_seconds(EPOCH_SECONDS).expect("epoch")
}

/// Returns the deterministic test signer.
pub fn test_signer() -> Ed25519Signer {
    Ed25519Signer::from_secret_bytes("store-test", &[11; 32])
}

/// Returns a temp dir and the database path inside it.
pub fn temp_db() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state").join("kernel.db");
    (dir, path)
}

/// Opens a store at `path` with default pragmas.
pub fn open(path: &Path) -> SqliteKernelStore {
    SqliteKernelStore::new(&SqliteStoreConfig::at(path)).expect("open store")
}

/// Builds a signed receipt in `session` at `clock` linked to `prev_hash`.
pub fn signed_receipt(signer: &Ed25519Signer, decision: &str, session: &str, clock: u64, prev_hash: &str) -> Receipt {
    let decision_id = DecisionId::new(decision);
    let mut receipt = Receipt {
        receipt_id: Receipt::id_for(&decision_id),
        decision_id,
        effect_id: EffectId::new(format!("eff-{decision}")),
        session_id: Some(SessionId::new(session)),
        status: ReceiptStatus::Success,
        blob_hash: None,
        output_hash: format!("sha256:{}", "cd".repeat(32)),
        args_hash: None,
        timestamp: epoch(),
        prev_hash: prev_hash.to_string(),
        lamport_clock: clock,
        signature: String::new(),
    };
    signer.sign_receipt(&mut receipt).expect("sign receipt");
    receipt
}

/// Builds a signed session chain of `len` receipts.
pub fn signed_chain(signer: &Ed25519Signer, session: &str, len: u64) -> Vec<Receipt> {
    let mut chain: Vec<Receipt> = Vec::new();
    for clock in 1..=len {
        let prev_hash = chain.last().map_or(GENESIS_PREV_HASH, |prev| prev.signature.as_str()).to_string();
        chain.push(signed_receipt(signer, &format!("{session}-dec-{clock}"), session, clock, &prev_hash));
    }
    chain
}

/// Builds an effect invoking `tool`.
pub fn effect(id: &str, tool: &str) -> Effect {
    let mut params = Map::new();
    params.insert("tool_name".to_string(), json!(tool));
    Effect {
        effect_id: EffectId::new(id),
        params,
        args_hash: None,
        output_hash: None,
    }
}

/// Builds a signed `PASS` decision in `session`.
pub fn signed_decision(signer: &dyn Signer, id: &str, session: &str) -> DecisionRecord {
    let mut input_context = Map::new();
    input_context.insert("session_id".to_string(), json!(session));
    let mut decision = DecisionRecord {
        id: DecisionId::new(id),
        phenotype_hash: None,
        snapshot: None,
        verdict: VERDICT_PASS.to_string(),
        reason: "policy satisfied".to_string(),
        input_context,
        signature: String::new(),
        signature_type: String::new(),
        timestamp: Some(epoch()),
    };
    signer.sign_decision(&mut decision).expect("sign decision");
    decision
}

/// Builds a signed intent for `decision`, valid for one hour from the epoch.
pub fn signed_intent(signer: &dyn Signer, decision: &DecisionRecord, tool: &str) -> AuthorizedExecutionIntent {
    let mut intent = AuthorizedExecutionIntent {
        id: IntentId::new(format!("intent-{}", decision.id)),
        decision_id: decision.id.clone(),
        effect_digest_hash: None,
        idempotency_key: None,
        issued_at: Some(epoch()),
        expires_at: epoch().plus_seconds(3600),
        signer: Some("store-test".to_string()),
        signature: String::new(),
        allowed_tool: Some(ToolName::new(tool)),
    };
    signer.sign_intent(&mut intent).expect("sign intent");
    intent
}
