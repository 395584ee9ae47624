// crates/autonomy-kernel-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Store Tests
// Description: Validate SqliteKernelStore receipt and outbox behavior.
// Purpose: Ensure durable persistence, atomic inserts, and integrity checks.
// Dependencies: autonomy-kernel-store-sqlite, autonomy-kernel-core, rusqlite, tempfile
// ============================================================================

//! ## Overview
//! Conformance tests for the SQLite-backed receipt and outbox store.
//! Exercises persistence across reopen, first-writer-wins inserts under
//! contention, tampered rows, schema versioning, and executor replay after
//! a restart.

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
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::thread;

use autonomy_kernel_core::DecisionId;
use autonomy_kernel_core::DriverError;
use autonomy_kernel_core::OutboxError;
use autonomy_kernel_core::OutboxStore;
use autonomy_kernel_core::ReceiptInsert;
use autonomy_kernel_core::ReceiptStore;
use autonomy_kernel_core::ReceiptStoreError;
use autonomy_kernel_core::SessionId;
use autonomy_kernel_core::ToolDriver;
use autonomy_kernel_core::ToolName;
use autonomy_kernel_core::interfaces::OutboxStatus;
use autonomy_kernel_core::runtime::GatedExecutor;
use autonomy_kernel_core::runtime::InMemoryArtifactStore;
use autonomy_kernel_core::runtime::ManualClock;
use autonomy_kernel_core::verify_receipt_chain;
use autonomy_kernel_store_sqlite::SqliteKernelStore;
use autonomy_kernel_store_sqlite::SqliteStoreConfig;
use autonomy_kernel_store_sqlite::SqliteStoreError;
use autonomy_kernel_store_sqlite::SqliteStoreMode;
use autonomy_kernel_store_sqlite::SqliteSyncMode;
use rusqlite::Connection;
use rusqlite::params;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::common::effect;
use crate::common::epoch;
use crate::common::open;
use crate::common::signed_chain;
use crate::common::signed_decision;
use crate::common::signed_intent;
use crate::common::signed_receipt;
use crate::common::temp_db;
use crate::common::test_signer;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Driver counting its invocations through a shared counter.
struct CountingDriver {
    /// Number of calls received.
    calls: Arc<std::sync::atomic::AtomicUsize>,
}

impl ToolDriver for CountingDriver {
    fn execute(&self, _tool: &ToolName, _params: &Map<String, Value>) -> Result<Value, DriverError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(json!({"written": true}))
    }
}

// ============================================================================
// SECTION: Receipts
// ============================================================================

/// Tests that receipts survive closing and reopening the database.
#[test]
fn receipts_persist_across_reopen() {
    let signer = test_signer();
    let (_dir, path) = temp_db();
    let receipt = signed_receipt(&signer, "dec-1", "s1", 1, "GENESIS");
    {
        let store = open(&path);
        assert_eq!(store.insert_if_absent(&receipt).unwrap(), ReceiptInsert::Inserted);
    }
    let store = open(&path);
    assert_eq!(store.get(&DecisionId::new("dec-1")).unwrap(), Some(receipt));
    assert!(store.get(&DecisionId::new("dec-missing")).unwrap().is_none());
}

/// Tests that a second receipt for the same decision returns the stored one.
#[test]
fn insert_if_absent_is_first_writer_wins() {
    let signer = test_signer();
    let (_dir, path) = temp_db();
    let store = open(&path);
    let original = signed_receipt(&signer, "dec-2", "s1", 1, "GENESIS");
    let competitor = signed_receipt(&signer, "dec-2", "s1", 7, "other");
    store.insert_if_absent(&original).unwrap();
    match store.insert_if_absent(&competitor).unwrap() {
        ReceiptInsert::Existing(existing) => assert_eq!(*existing, original),
        ReceiptInsert::Inserted => panic!("competitor must not overwrite"),
    }
    assert_eq!(store.get(&DecisionId::new("dec-2")).unwrap().unwrap().lamport_clock, 1);
}

/// Tests that unsigned receipts never reach the database.
#[test]
fn unsigned_receipts_are_rejected() {
    let (_dir, path) = temp_db();
    let store = open(&path);
    let mut unsigned = signed_receipt(&test_signer(), "dec-3", "s1", 1, "GENESIS");
    unsigned.signature.clear();
    assert!(matches!(store.insert_if_absent(&unsigned), Err(ReceiptStoreError::Unsigned(_))));
    assert!(store.get(&DecisionId::new("dec-3")).unwrap().is_none());
}

/// Tests that concurrent inserts for one decision store exactly one receipt.
#[test]
fn concurrent_inserts_store_exactly_one_receipt() {
    let signer = test_signer();
    let (_dir, path) = temp_db();
    let store = Arc::new(open(&path));
    let handles: Vec<_> = (1..=8u64)
        .map(|clock| {
            let store = Arc::clone(&store);
            let receipt = signed_receipt(&signer, "dec-race", "s1", clock, "GENESIS");
            thread::spawn(move || store.insert_if_absent(&receipt).unwrap())
        })
        .collect();
    let outcomes: Vec<ReceiptInsert> =
        handles.into_iter().map(|handle| handle.join().unwrap()).collect();
    let inserted = outcomes.iter().filter(|outcome| **outcome == ReceiptInsert::Inserted).count();
    assert_eq!(inserted, 1);
    let stored = store.get(&DecisionId::new("dec-race")).unwrap().unwrap();
    for outcome in outcomes {
        if let ReceiptInsert::Existing(existing) = outcome {
            assert_eq!(*existing, stored);
        }
    }
}

/// Tests session lookups by lamport clock and the stored chain verifies.
#[test]
fn session_queries_follow_lamport_order() {
    let signer = test_signer();
    let (_dir, path) = temp_db();
    let store = open(&path);
    let chain = signed_chain(&signer, "s-chain", 4);
    for receipt in chain.iter().rev() {
        store.insert_if_absent(receipt).unwrap();
    }
    store.insert_if_absent(&signed_receipt(&signer, "other", "s-other", 9, "GENESIS")).unwrap();

    let session = SessionId::new("s-chain");
    let last = store.last_for_session(&session).unwrap().unwrap();
    assert_eq!(last.lamport_clock, 4);
    let loaded = store.receipts_for_session(&session).unwrap();
    assert_eq!(loaded, chain);
    assert!(verify_receipt_chain(&loaded, &signer.verifier()).valid);
    assert!(store.last_for_session(&SessionId::new("empty")).unwrap().is_none());
}

/// Tests that tampered receipt bytes fail the stored hash check.
#[test]
fn tampered_receipt_is_reported_as_corrupt() {
    let signer = test_signer();
    let (_dir, path) = temp_db();
    let store = open(&path);
    store.insert_if_absent(&signed_receipt(&signer, "dec-t", "s1", 1, "GENESIS")).unwrap();

    let connection = Connection::open(&path).unwrap();
    connection
        .execute(
            "UPDATE receipts SET receipt_json = ?1 WHERE decision_id = ?2",
            params![br#"{"tampered":true}"#.to_vec(), "dec-t"],
        )
        .unwrap();
    drop(connection);

    assert!(matches!(store.get(&DecisionId::new("dec-t")), Err(ReceiptStoreError::Corrupt(_))));
    assert!(matches!(
        store.last_for_session(&SessionId::new("s1")),
        Err(ReceiptStoreError::Corrupt(_))
    ));
}

/// Tests that a payload stored under the wrong key is rejected.
#[test]
fn mismatched_key_is_reported_as_corrupt() {
    let signer = test_signer();
    let (_dir, path) = temp_db();
    let store = open(&path);
    store.insert_if_absent(&signed_receipt(&signer, "dec-a", "s1", 1, "GENESIS")).unwrap();

    let connection = Connection::open(&path).unwrap();
    connection
        .execute("UPDATE receipts SET decision_id = 'dec-b' WHERE decision_id = 'dec-a'", [])
        .unwrap();
    drop(connection);

    assert!(matches!(store.get(&DecisionId::new("dec-b")), Err(ReceiptStoreError::Corrupt(_))));
}

/// Tests that an unknown schema version refuses to open.
#[test]
fn unsupported_schema_version_fails_closed() {
    let (_dir, path) = temp_db();
    drop(open(&path));
    let connection = Connection::open(&path).unwrap();
    connection.execute("UPDATE store_meta SET version = 99", []).unwrap();
    drop(connection);
    assert!(matches!(
        SqliteKernelStore::new(&SqliteStoreConfig::at(&path)),
        Err(SqliteStoreError::VersionMismatch(_))
    ));
}

/// Tests that a directory is not accepted as the database path.
#[test]
fn directory_path_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        SqliteKernelStore::new(&SqliteStoreConfig::at(dir.path())),
        Err(SqliteStoreError::Invalid(_))
    ));
}

/// Tests that delete journal and normal sync modes open cleanly.
#[test]
fn alternate_pragmas_open_cleanly() {
    let (_dir, path) = temp_db();
    let config = SqliteStoreConfig {
        path,
        busy_timeout_ms: 250,
        journal_mode: SqliteStoreMode::Delete,
        sync_mode: SqliteSyncMode::Normal,
    };
    let store = SqliteKernelStore::new(&config).unwrap();
    let receipt = signed_receipt(&test_signer(), "dec-p", "s1", 1, "GENESIS");
    assert_eq!(store.insert_if_absent(&receipt).unwrap(), ReceiptInsert::Inserted);
}

// ============================================================================
// SECTION: Outbox
// ============================================================================

/// Tests the reservation lifecycle and persistence of pending entries.
#[test]
fn outbox_lifecycle_persists() {
    let signer = test_signer();
    let (_dir, path) = temp_db();
    let first = signed_decision(&signer, "dec-o1", "s1");
    let second = signed_decision(&signer, "dec-o2", "s1");
    {
        let store = open(&path);
        store.schedule(&effect("eff-o1", "fs.write"), &first).unwrap();
        store.schedule(&effect("eff-o2", "fs.write"), &second).unwrap();
        assert!(matches!(
            store.schedule(&effect("eff-o1", "fs.write"), &first),
            Err(OutboxError::AlreadyScheduled(_))
        ));
        store.mark_done(&first.id).unwrap();
    }
    let store = open(&path);
    assert_eq!(store.outbox_status(&first.id).unwrap(), Some(OutboxStatus::Done));
    let pending = store.pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].decision_id, second.id);
    assert!(matches!(
        store.schedule(&effect("eff-o1", "fs.write"), &first),
        Err(OutboxError::AlreadyScheduled(_))
    ));
}

/// Tests that release frees scheduled entries but leaves done entries.
#[test]
fn outbox_release_only_frees_scheduled_entries() {
    let signer = test_signer();
    let (_dir, path) = temp_db();
    let store = open(&path);
    let decision = signed_decision(&signer, "dec-r", "s1");

    store.schedule(&effect("eff-r", "fs.write"), &decision).unwrap();
    store.release(&decision.id).unwrap();
    assert_eq!(store.outbox_status(&decision.id).unwrap(), None);

    store.schedule(&effect("eff-r", "fs.write"), &decision).unwrap();
    store.mark_done(&decision.id).unwrap();
    store.release(&decision.id).unwrap();
    assert_eq!(store.outbox_status(&decision.id).unwrap(), Some(OutboxStatus::Done));
    assert!(matches!(
        store.mark_done(&DecisionId::new("dec-unknown")),
        Err(OutboxError::NotScheduled(_))
    ));
}

// ============================================================================
// SECTION: Executor Integration
// ============================================================================

/// Tests that a restarted executor replays from the durable store without
/// dispatching the tool again.
#[test]
fn executor_replays_after_restart() {
    let signer = Arc::new(test_signer());
    let (_dir, path) = temp_db();
    let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let decision = signed_decision(signer.as_ref(), "dec-exec", "s-exec");
    let intent = signed_intent(signer.as_ref(), &decision, "fs.write");
    let request = effect("eff-exec", "fs.write");

    let build = |store: Arc<SqliteKernelStore>| {
        GatedExecutor::new(
            Arc::new(signer.verifier()),
            signer.clone(),
            Arc::new(CountingDriver {
                calls: Arc::clone(&calls),
            }),
            store.clone(),
            Arc::new(InMemoryArtifactStore::new()),
        )
        .with_outbox(store)
        .with_clock(Arc::new(ManualClock::new(epoch())))
    };

    let (first, _) = {
        let store = Arc::new(open(&path));
        build(store).execute(&request, Some(&decision), Some(&intent)).unwrap()
    };
    assert_eq!(first.prev_hash, "GENESIS");
    assert_eq!(first.lamport_clock, 1);

    let store = Arc::new(open(&path));
    assert_eq!(store.outbox_status(&decision.id).unwrap(), Some(OutboxStatus::Done));
    let (replayed, artifact) =
        build(Arc::clone(&store)).execute(&request, Some(&decision), Some(&intent)).unwrap();
    assert_eq!(replayed, first);
    assert_eq!(artifact.digest, first.output_hash);
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);

    let next = signed_decision(signer.as_ref(), "dec-exec-2", "s-exec");
    let next_intent = signed_intent(signer.as_ref(), &next, "fs.write");
    let (second, _) = build(Arc::clone(&store))
        .execute(&effect("eff-exec-2", "fs.write"), Some(&next), Some(&next_intent))
        .unwrap();
    assert_eq!(second.prev_hash, first.signature);
    assert_eq!(second.lamport_clock, 2);
}
