// crates/autonomy-kernel-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Kernel Store
// Description: Durable ReceiptStore and OutboxStore backends using SQLite.
// Purpose: Persist signed receipts and outbox reservations across restarts.
// Dependencies: autonomy-kernel-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides [`SqliteKernelStore`], a SQLite-backed implementation
//! of the kernel's receipt and outbox collaborators. Receipts are stored as
//! canonical JSON next to their SHA-256 and re-verified on every load; the
//! insert-if-absent and outbox reservation paths are single statements so a
//! racing writer can never replace a stored receipt.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_RECEIPT_BYTES;
pub use store::SqliteKernelStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
