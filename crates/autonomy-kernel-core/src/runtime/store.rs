// crates/autonomy-kernel-core/src/runtime/store.rs
// ============================================================================
// Module: Autonomy Kernel Stores
// Description: In-memory receipt/outbox/artifact stores and a file artifact store.
// Purpose: Provide deterministic collaborators for tests, demos, and local runs.
// Dependencies: crate::{core, interfaces}, tempfile
// ============================================================================

//! ## Overview
//! In-memory stores keep their maps behind an `Arc<Mutex<..>>` so clones share
//! state and every operation is atomic with respect to concurrent callers.
//! [`FileArtifactStore`] persists content-addressed blobs as
//! `<root>/<hex>.blob`, writing through a temporary file and a rename, and
//! re-hashes blobs on read so on-disk corruption is detected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use tempfile::Builder;

use crate::core::custody::DecisionRecord;
use crate::core::custody::Effect;
use crate::core::custody::Receipt;
use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::HashDigest;
use crate::core::hashing::hash_bytes;
use crate::core::identifiers::DecisionId;
use crate::core::identifiers::SessionId;
use crate::interfaces::ArtifactStore;
use crate::interfaces::ArtifactStoreError;
use crate::interfaces::OutboxEntry;
use crate::interfaces::OutboxError;
use crate::interfaces::OutboxStatus;
use crate::interfaces::OutboxStore;
use crate::interfaces::ReceiptInsert;
use crate::interfaces::ReceiptStore;
use crate::interfaces::ReceiptStoreError;

// ============================================================================
// SECTION: Receipt Store
// ============================================================================

/// In-memory receipt store keyed by decision identifier.
#[derive(Debug, Default, Clone)]
pub struct InMemoryReceiptStore {
    /// Receipts keyed by decision id.
    receipts: Arc<Mutex<BTreeMap<String, Receipt>>>,
}

impl InMemoryReceiptStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored receipt ordered by decision id.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptStoreError::Store`] when the store lock is poisoned.
    pub fn all(&self) -> Result<Vec<Receipt>, ReceiptStoreError> {
        let guard = self.lock()?;
        Ok(guard.values().cloned().collect())
    }

    /// Acquires the receipt map.
    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Receipt>>, ReceiptStoreError> {
        self.receipts
            .lock()
            .map_err(|_| ReceiptStoreError::Store("receipt store mutex poisoned".to_string()))
    }
}

impl ReceiptStore for InMemoryReceiptStore {
    fn get(&self, decision_id: &DecisionId) -> Result<Option<Receipt>, ReceiptStoreError> {
        let guard = self.lock()?;
        Ok(guard.get(decision_id.as_str()).cloned())
    }

    fn insert_if_absent(&self, receipt: &Receipt) -> Result<ReceiptInsert, ReceiptStoreError> {
        if receipt.signature.is_empty() {
            return Err(ReceiptStoreError::Unsigned(receipt.receipt_id.to_string()));
        }
        let mut guard = self.lock()?;
        match guard.entry(receipt.decision_id.as_str().to_string()) {
            Entry::Occupied(existing) => Ok(ReceiptInsert::Existing(Box::new(existing.get().clone()))),
            Entry::Vacant(slot) => {
                slot.insert(receipt.clone());
                Ok(ReceiptInsert::Inserted)
            }
        }
    }

    fn last_for_session(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<Receipt>, ReceiptStoreError> {
        let guard = self.lock()?;
        Ok(guard
            .values()
            .filter(|receipt| receipt.session_id.as_ref() == Some(session_id))
            .max_by_key(|receipt| receipt.lamport_clock)
            .cloned())
    }
}

// ============================================================================
// SECTION: Outbox Store
// ============================================================================

/// In-memory outbox keyed by decision identifier.
#[derive(Debug, Default, Clone)]
pub struct InMemoryOutboxStore {
    /// Entries keyed by decision id.
    entries: Arc<Mutex<BTreeMap<String, OutboxEntry>>>,
}

impl InMemoryOutboxStore {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the status recorded for a decision.
    ///
    /// # Errors
    ///
    /// Returns [`OutboxError::Store`] when the outbox lock is poisoned.
    pub fn status(&self, decision_id: &DecisionId) -> Result<Option<OutboxStatus>, OutboxError> {
        let guard = self.lock()?;
        Ok(guard.get(decision_id.as_str()).map(|entry| entry.status))
    }

    /// Acquires the entry map.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, OutboxEntry>>, OutboxError> {
        self.entries.lock().map_err(|_| OutboxError::Store("outbox mutex poisoned".to_string()))
    }
}

impl OutboxStore for InMemoryOutboxStore {
    fn schedule(&self, effect: &Effect, decision: &DecisionRecord) -> Result<(), OutboxError> {
        let mut guard = self.lock()?;
        match guard.entry(decision.id.as_str().to_string()) {
            Entry::Occupied(_) => Err(OutboxError::AlreadyScheduled(decision.id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(OutboxEntry {
                    decision_id: decision.id.clone(),
                    effect_id: effect.effect_id.clone(),
                    status: OutboxStatus::Scheduled,
                });
                Ok(())
            }
        }
    }

    fn mark_done(&self, decision_id: &DecisionId) -> Result<(), OutboxError> {
        let mut guard = self.lock()?;
        let Some(entry) = guard.get_mut(decision_id.as_str()) else {
            return Err(OutboxError::NotScheduled(decision_id.to_string()));
        };
        entry.status = OutboxStatus::Done;
        Ok(())
    }

    fn release(&self, decision_id: &DecisionId) -> Result<(), OutboxError> {
        let mut guard = self.lock()?;
        if guard.get(decision_id.as_str()).is_some_and(|entry| entry.status == OutboxStatus::Scheduled)
        {
            guard.remove(decision_id.as_str());
        }
        Ok(())
    }

    fn pending(&self) -> Result<Vec<OutboxEntry>, OutboxError> {
        let guard = self.lock()?;
        Ok(guard.values().filter(|entry| entry.status == OutboxStatus::Scheduled).cloned().collect())
    }
}

// ============================================================================
// SECTION: Artifact Stores
// ============================================================================

/// Parses and validates a `sha256:` artifact address.
fn parse_address(digest: &str) -> Result<HashDigest, ArtifactStoreError> {
    HashDigest::parse_prefixed(digest).map_err(|err| ArtifactStoreError::InvalidDigest(err.to_string()))
}

/// In-memory content-addressed blob store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryArtifactStore {
    /// Blobs keyed by prefixed digest.
    blobs: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryArtifactStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored blobs.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError::Io`] when the store lock is poisoned.
    pub fn len(&self) -> Result<usize, ArtifactStoreError> {
        Ok(self.lock()?.len())
    }

    /// Acquires the blob map.
    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>>, ArtifactStoreError> {
        self.blobs.lock().map_err(|_| ArtifactStoreError::Io("artifact store mutex poisoned".to_string()))
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn store(&self, bytes: &[u8]) -> Result<String, ArtifactStoreError> {
        let address = hash_bytes(DEFAULT_HASH_ALGORITHM, bytes).prefixed();
        let mut guard = self.lock()?;
        guard.entry(address.clone()).or_insert_with(|| bytes.to_vec());
        Ok(address)
    }

    fn get(&self, digest: &str) -> Result<Option<Vec<u8>>, ArtifactStoreError> {
        let address = parse_address(digest)?.prefixed();
        let guard = self.lock()?;
        Ok(guard.get(&address).cloned())
    }

    fn exists(&self, digest: &str) -> Result<bool, ArtifactStoreError> {
        let address = parse_address(digest)?.prefixed();
        let guard = self.lock()?;
        Ok(guard.contains_key(&address))
    }
}

/// Directory-backed content-addressed blob store.
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    /// Blob directory.
    root: PathBuf,
}

impl FileArtifactStore {
    /// Opens a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactStoreError::Io`] when the directory cannot be created.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, ArtifactStoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|err| ArtifactStoreError::Io(err.to_string()))?;
        Ok(Self {
            root,
        })
    }

    /// Returns the blob directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the blob path for a digest.
    fn blob_path(&self, digest: &HashDigest) -> PathBuf {
        self.root.join(format!("{}.blob", digest.value))
    }
}

impl ArtifactStore for FileArtifactStore {
    fn store(&self, bytes: &[u8]) -> Result<String, ArtifactStoreError> {
        let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, bytes);
        let path = self.blob_path(&digest);
        if path.is_file() {
            return Ok(digest.prefixed());
        }
        // Dropping the temp file on any failure below removes it from disk.
        let mut temp = Builder::new()
            .prefix(&format!(".{}.", digest.value))
            .suffix(".tmp")
            .tempfile_in(&self.root)
            .map_err(|err| ArtifactStoreError::Io(err.to_string()))?;
        temp.write_all(bytes).map_err(|err| ArtifactStoreError::Io(err.to_string()))?;
        temp.as_file().sync_all().map_err(|err| ArtifactStoreError::Io(err.to_string()))?;
        temp.persist(&path).map_err(|err| ArtifactStoreError::Io(err.error.to_string()))?;
        Ok(digest.prefixed())
    }

    fn get(&self, digest: &str) -> Result<Option<Vec<u8>>, ArtifactStoreError> {
        let expected = parse_address(digest)?;
        let path = self.blob_path(&expected);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(ArtifactStoreError::Io(err.to_string())),
        };
        let actual = hash_bytes(expected.algorithm, &bytes);
        if actual != expected {
            return Err(ArtifactStoreError::Corrupt(format!(
                "blob {} hashes to {}",
                expected.prefixed(),
                actual.prefixed()
            )));
        }
        Ok(Some(bytes))
    }

    fn exists(&self, digest: &str) -> Result<bool, ArtifactStoreError> {
        let expected = parse_address(digest)?;
        Ok(self.blob_path(&expected).is_file())
    }
}
