// crates/autonomy-kernel-core/src/runtime/clock.rs
// ============================================================================
// Module: Autonomy Kernel Clocks
// Description: Wall-clock and manually driven clock implementations.
// Purpose: Feed deterministic time into the validator, gate, and executor.
// Dependencies: crate::core::time, crate::interfaces, time
// ============================================================================

//! ## Overview
//! [`SystemClock`] reads UTC wall-clock time. [`ManualClock`] holds a fixed
//! instant that tests and replay tooling advance explicitly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use time::OffsetDateTime;

use crate::core::time::Timestamp;
use crate::interfaces::Clock;

// ============================================================================
// SECTION: Clocks
// ============================================================================

/// UTC wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(OffsetDateTime::now_utc())
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    /// Current instant shared across clones.
    current: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock to `instant`.
    pub fn set(&self, instant: Timestamp) {
        let mut guard = self.current.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = instant;
    }

    /// Advances the clock by whole seconds.
    pub fn advance_seconds(&self, seconds: i64) {
        let mut guard = self.current.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = guard.plus_seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
