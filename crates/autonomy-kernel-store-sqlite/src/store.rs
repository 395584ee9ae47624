// crates/autonomy-kernel-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Kernel Store
// Description: Durable receipt and outbox storage backed by SQLite.
// Purpose: Persist signed receipts with integrity hashes and atomic inserts.
// Dependencies: autonomy-kernel-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteKernelStore`] implements [`ReceiptStore`] and [`OutboxStore`] on a
//! single `SQLite` connection. Receipts are keyed by decision identifier and
//! written with `ON CONFLICT DO NOTHING`, so the first writer wins and later
//! writers read back the stored receipt in the same transaction. Each row
//! carries the SHA-256 of its canonical JSON; loads fail closed on mismatch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use autonomy_kernel_core::DecisionId;
use autonomy_kernel_core::DecisionRecord;
use autonomy_kernel_core::Effect;
use autonomy_kernel_core::EffectId;
use autonomy_kernel_core::OutboxError;
use autonomy_kernel_core::OutboxStore;
use autonomy_kernel_core::Receipt;
use autonomy_kernel_core::ReceiptInsert;
use autonomy_kernel_core::ReceiptStore;
use autonomy_kernel_core::ReceiptStoreError;
use autonomy_kernel_core::SessionId;
use autonomy_kernel_core::hashing::DEFAULT_HASH_ALGORITHM;
use autonomy_kernel_core::hashing::HashAlgorithm;
use autonomy_kernel_core::hashing::canonical_json_bytes;
use autonomy_kernel_core::hashing::hash_bytes;
use autonomy_kernel_core::interfaces::OutboxEntry;
use autonomy_kernel_core::interfaces::OutboxStatus;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum serialized receipt size accepted by the store.
pub const MAX_RECEIPT_BYTES: usize = 1024 * 1024;
/// Outbox status label for reserved entries.
const STATUS_SCHEDULED: &str = "scheduled";
/// Outbox status label for completed entries.
const STATUS_DONE: &str = "done";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` kernel store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Returns a config for `path` with default pragmas.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or hash mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Stored payload exceeded the size limit.
    #[error("sqlite store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

impl From<SqliteStoreError> for ReceiptStoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) | SqliteStoreError::Invalid(message) => {
                Self::Store(message)
            }
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Corrupt(format!(
                "receipt_json exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
        }
    }
}

impl From<SqliteStoreError> for OutboxError {
    fn from(error: SqliteStoreError) -> Self {
        Self::Store(error.to_string())
    }
}

/// Maps a rusqlite error into a store error.
#[allow(clippy::needless_pass_by_value, reason = "Used directly with map_err.")]
fn db_error(error: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(error.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed receipt and outbox store.
#[derive(Clone)]
pub struct SqliteKernelStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteKernelStore {
    /// Opens an `SQLite`-backed kernel store, creating the schema if needed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized, or when it carries an unsupported schema version.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns every receipt in a session ordered by lamport clock.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when loading or verification fails.
    pub fn receipts_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<Receipt>, SqliteStoreError> {
        let rows = {
            let guard = self.lock()?;
            let mut statement = guard
                .prepare(
                    "SELECT decision_id, receipt_json, receipt_hash, hash_algorithm FROM receipts \
                     WHERE session_id = ?1 ORDER BY lamport_clock ASC",
                )
                .map_err(db_error)?;
            let rows = statement
                .query_map(params![session_id.as_str()], StoredRow::from_row)
                .map_err(db_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(db_error)?;
            drop(statement);
            drop(guard);
            rows
        };
        rows.into_iter().map(StoredRow::into_receipt).collect()
    }

    /// Returns the outbox status for a decision.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the lookup fails or the stored
    /// status is unknown.
    pub fn outbox_status(
        &self,
        decision_id: &DecisionId,
    ) -> Result<Option<OutboxStatus>, SqliteStoreError> {
        let label: Option<String> = {
            let guard = self.lock()?;
            guard
                .query_row(
                    "SELECT status FROM outbox WHERE decision_id = ?1",
                    params![decision_id.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_error)?
        };
        label.as_deref().map(parse_outbox_status).transpose()
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    /// Loads and verifies the receipt for a decision.
    fn load_receipt(&self, decision_id: &DecisionId) -> Result<Option<Receipt>, SqliteStoreError> {
        let row = {
            let guard = self.lock()?;
            select_by_decision(&guard, decision_id)?
        };
        row.map(StoredRow::into_receipt).transpose()
    }

    /// Loads and verifies the highest-clock receipt in a session.
    fn load_last(&self, session_id: &SessionId) -> Result<Option<Receipt>, SqliteStoreError> {
        let row = {
            let guard = self.lock()?;
            guard
                .query_row(
                    "SELECT decision_id, receipt_json, receipt_hash, hash_algorithm FROM receipts \
                     WHERE session_id = ?1 ORDER BY lamport_clock DESC LIMIT 1",
                    params![session_id.as_str()],
                    StoredRow::from_row,
                )
                .optional()
                .map_err(db_error)?
        };
        row.map(StoredRow::into_receipt).transpose()
    }

    /// Inserts a receipt unless the decision already has one.
    fn insert_receipt(&self, receipt: &Receipt) -> Result<ReceiptInsert, SqliteStoreError> {
        let canonical_json = canonical_json_bytes(receipt)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        if canonical_json.len() > MAX_RECEIPT_BYTES {
            return Err(SqliteStoreError::TooLarge {
                max_bytes: MAX_RECEIPT_BYTES,
                actual_bytes: canonical_json.len(),
            });
        }
        let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, &canonical_json);
        let lamport_clock = i64::try_from(receipt.lamport_clock)
            .map_err(|_| SqliteStoreError::Invalid("lamport_clock exceeds i64".to_string()))?;
        let existing = {
            let mut guard = self.lock()?;
            let tx = guard.transaction().map_err(db_error)?;
            let inserted = tx
                .execute(
                    "INSERT INTO receipts (decision_id, receipt_id, session_id, lamport_clock, \
                     receipt_json, receipt_hash, hash_algorithm, stored_at) VALUES (?1, ?2, ?3, \
                     ?4, ?5, ?6, ?7, ?8) ON CONFLICT(decision_id) DO NOTHING",
                    params![
                        receipt.decision_id.as_str(),
                        receipt.receipt_id.as_str(),
                        receipt.session_id.as_ref().map(SessionId::as_str),
                        lamport_clock,
                        canonical_json,
                        digest.value,
                        digest.algorithm.label(),
                        unix_millis()
                    ],
                )
                .map_err(db_error)?;
            let existing =
                if inserted == 0 { select_by_decision(&tx, &receipt.decision_id)? } else { None };
            tx.commit().map_err(db_error)?;
            drop(guard);
            existing
        };
        match existing {
            None => Ok(ReceiptInsert::Inserted),
            Some(row) => Ok(ReceiptInsert::Existing(Box::new(row.into_receipt()?))),
        }
    }

    /// Reserves a decision; returns false when an entry already exists.
    fn reserve(&self, effect_id: &EffectId, decision_id: &DecisionId) -> Result<bool, SqliteStoreError> {
        let now = unix_millis();
        let guard = self.lock()?;
        let inserted = guard
            .execute(
                "INSERT INTO outbox (decision_id, effect_id, status, scheduled_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?4) ON CONFLICT(decision_id) DO NOTHING",
                params![decision_id.as_str(), effect_id.as_str(), STATUS_SCHEDULED, now],
            )
            .map_err(db_error)?;
        drop(guard);
        Ok(inserted == 1)
    }

    /// Marks a reservation done; returns false for unknown decisions.
    fn complete(&self, decision_id: &DecisionId) -> Result<bool, SqliteStoreError> {
        let guard = self.lock()?;
        let updated = guard
            .execute(
                "UPDATE outbox SET status = ?2, updated_at = ?3 WHERE decision_id = ?1",
                params![decision_id.as_str(), STATUS_DONE, unix_millis()],
            )
            .map_err(db_error)?;
        drop(guard);
        Ok(updated == 1)
    }

    /// Deletes a reservation that has not completed.
    fn delete_scheduled(&self, decision_id: &DecisionId) -> Result<(), SqliteStoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "DELETE FROM outbox WHERE decision_id = ?1 AND status = ?2",
                params![decision_id.as_str(), STATUS_SCHEDULED],
            )
            .map_err(db_error)?;
        drop(guard);
        Ok(())
    }

    /// Lists scheduled entries in reservation order.
    fn scheduled_entries(&self) -> Result<Vec<OutboxEntry>, SqliteStoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT decision_id, effect_id FROM outbox WHERE status = ?1 ORDER BY \
                 scheduled_at ASC, decision_id ASC",
            )
            .map_err(db_error)?;
        let entries = statement
            .query_map(params![STATUS_SCHEDULED], |row| {
                let decision_id: String = row.get(0)?;
                let effect_id: String = row.get(1)?;
                Ok(OutboxEntry {
                    decision_id: DecisionId::new(decision_id),
                    effect_id: EffectId::new(effect_id),
                    status: OutboxStatus::Scheduled,
                })
            })
            .map_err(db_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_error)?;
        drop(statement);
        drop(guard);
        Ok(entries)
    }
}

impl ReceiptStore for SqliteKernelStore {
    fn get(&self, decision_id: &DecisionId) -> Result<Option<Receipt>, ReceiptStoreError> {
        self.load_receipt(decision_id).map_err(ReceiptStoreError::from)
    }

    fn insert_if_absent(&self, receipt: &Receipt) -> Result<ReceiptInsert, ReceiptStoreError> {
        if receipt.signature.is_empty() {
            return Err(ReceiptStoreError::Unsigned(receipt.receipt_id.to_string()));
        }
        self.insert_receipt(receipt).map_err(ReceiptStoreError::from)
    }

    fn last_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<Receipt>, ReceiptStoreError> {
        self.load_last(session_id).map_err(ReceiptStoreError::from)
    }
}

impl OutboxStore for SqliteKernelStore {
    fn schedule(&self, effect: &Effect, decision: &DecisionRecord) -> Result<(), OutboxError> {
        if self.reserve(&effect.effect_id, &decision.id)? {
            Ok(())
        } else {
            Err(OutboxError::AlreadyScheduled(decision.id.to_string()))
        }
    }

    fn mark_done(&self, decision_id: &DecisionId) -> Result<(), OutboxError> {
        if self.complete(decision_id)? {
            Ok(())
        } else {
            Err(OutboxError::NotScheduled(decision_id.to_string()))
        }
    }

    fn release(&self, decision_id: &DecisionId) -> Result<(), OutboxError> {
        self.delete_scheduled(decision_id).map_err(OutboxError::from)
    }

    fn pending(&self) -> Result<Vec<OutboxEntry>, OutboxError> {
        self.scheduled_entries().map_err(OutboxError::from)
    }
}

// ============================================================================
// SECTION: Rows
// ============================================================================

/// Raw receipt row prior to integrity verification.
struct StoredRow {
    /// Key the row is stored under.
    decision_id: String,
    /// Canonical receipt JSON.
    bytes: Vec<u8>,
    /// Stored hex digest of `bytes`.
    hash: String,
    /// Stored hash algorithm label.
    algorithm: String,
}

impl StoredRow {
    /// Reads a row selected as `(decision_id, receipt_json, receipt_hash, hash_algorithm)`.
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            decision_id: row.get(0)?,
            bytes: row.get(1)?,
            hash: row.get(2)?,
            algorithm: row.get(3)?,
        })
    }

    /// Verifies the stored hash and decodes the receipt.
    fn into_receipt(self) -> Result<Receipt, SqliteStoreError> {
        if self.bytes.len() > MAX_RECEIPT_BYTES {
            return Err(SqliteStoreError::TooLarge {
                max_bytes: MAX_RECEIPT_BYTES,
                actual_bytes: self.bytes.len(),
            });
        }
        let algorithm = parse_hash_algorithm(&self.algorithm)?;
        let expected = hash_bytes(algorithm, &self.bytes);
        if expected.value != self.hash {
            return Err(SqliteStoreError::Corrupt(format!(
                "hash mismatch for decision {}",
                self.decision_id
            )));
        }
        let receipt: Receipt = serde_json::from_slice(&self.bytes)
            .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
        if receipt.decision_id.as_str() != self.decision_id {
            return Err(SqliteStoreError::Corrupt(
                "decision_id mismatch between key and payload".to_string(),
            ));
        }
        Ok(receipt)
    }
}

/// Selects the stored row for a decision.
fn select_by_decision(
    connection: &Connection,
    decision_id: &DecisionId,
) -> Result<Option<StoredRow>, SqliteStoreError> {
    connection
        .query_row(
            "SELECT decision_id, receipt_json, receipt_hash, hash_algorithm FROM receipts WHERE \
             decision_id = ?1",
            params![decision_id.as_str()],
            StoredRow::from_row,
        )
        .optional()
        .map_err(db_error)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with durable defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies journal, sync, and busy-timeout pragmas.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_error)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => create_tables(&tx)?,
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}

/// Creates the receipt and outbox tables at the current schema version.
fn create_tables(tx: &Transaction<'_>) -> Result<(), SqliteStoreError> {
    tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
        .map_err(db_error)?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS receipts (
            decision_id TEXT PRIMARY KEY,
            receipt_id TEXT NOT NULL,
            session_id TEXT,
            lamport_clock INTEGER NOT NULL,
            receipt_json BLOB NOT NULL,
            receipt_hash TEXT NOT NULL,
            hash_algorithm TEXT NOT NULL,
            stored_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_receipts_session
            ON receipts (session_id, lamport_clock);
        CREATE TABLE IF NOT EXISTS outbox (
            decision_id TEXT PRIMARY KEY,
            effect_id TEXT NOT NULL,
            status TEXT NOT NULL,
            scheduled_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );",
    )
    .map_err(db_error)
}

/// Parses a stored outbox status label.
fn parse_outbox_status(label: &str) -> Result<OutboxStatus, SqliteStoreError> {
    match label {
        STATUS_SCHEDULED => Ok(OutboxStatus::Scheduled),
        STATUS_DONE => Ok(OutboxStatus::Done),
        other => Err(SqliteStoreError::Corrupt(format!("unknown outbox status: {other}"))),
    }
}

/// Parses a hash algorithm label.
fn parse_hash_algorithm(label: &str) -> Result<HashAlgorithm, SqliteStoreError> {
    match label {
        "sha256" => Ok(HashAlgorithm::Sha256),
        other => Err(SqliteStoreError::Invalid(format!("unsupported hash algorithm: {other}"))),
    }
}

/// Returns the current unix epoch in milliseconds.
fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
