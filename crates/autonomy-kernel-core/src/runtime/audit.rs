// crates/autonomy-kernel-core/src/runtime/audit.rs
// ============================================================================
// Module: Kernel Audit Sinks
// Description: Structured audit trail sinks for executed effects.
// Purpose: Emit JSON-lines audit events without a global logger.
// Dependencies: crate::interfaces, serde_json
// ============================================================================

//! ## Overview
//! Audit sinks receive [`AuditEvent`] values from the executor and write
//! them as one JSON object per line. The stderr sink suits local operation,
//! the file sink appends and flushes per event, and the in-memory sink
//! captures events for callers that inspect the trail directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use crate::interfaces::AuditError;
use crate::interfaces::AuditEvent;
use crate::interfaces::AuditSink;

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Serializes an event to one JSON line.
fn encode_line(event: &AuditEvent) -> Result<String, AuditError> {
    serde_json::to_string(event).map_err(|err| AuditError::Serialization(err.to_string()))
}

/// Audit sink that logs JSON lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn append(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let payload = encode_line(event)?;
        writeln!(std::io::stderr(), "{payload}").map_err(|err| AuditError::Io(err.to_string()))
    }
}

/// Audit sink that appends JSON lines to a file.
#[derive(Debug)]
pub struct FileAuditSink {
    /// File handle guarded for concurrent writes.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens a file-backed audit sink in append mode.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Io`] when the file cannot be opened.
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| AuditError::Io(err.to_string()))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn append(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let payload = encode_line(event)?;
        let mut file =
            self.file.lock().map_err(|_| AuditError::Io("audit file mutex poisoned".to_string()))?;
        writeln!(file, "{payload}").map_err(|err| AuditError::Io(err.to_string()))?;
        file.flush().map_err(|err| AuditError::Io(err.to_string()))
    }
}

/// No-op audit sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn append(&self, _event: &AuditEvent) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Audit sink that keeps events in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAuditSink {
    /// Captured events in append order.
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns captured events in append order.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|guard| guard.clone()).unwrap_or_default()
    }

    /// Returns captured events with the given action.
    #[must_use]
    pub fn events_with_action(&self, action: &str) -> Vec<AuditEvent> {
        self.events().into_iter().filter(|event| event.action == action).collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn append(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let mut guard = self
            .events
            .lock()
            .map_err(|_| AuditError::Io("audit buffer mutex poisoned".to_string()))?;
        guard.push(event.clone());
        Ok(())
    }
}
