// crates/autonomy-kernel-core/src/runtime/usage.rs
// ============================================================================
// Module: Usage Meters
// Description: No-op and in-memory usage meters.
// Purpose: Record executed-effect usage per tenant.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Metering is best-effort: the executor records one [`UsageEvent`] per
//! successful execution and never fails an execution because metering did.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::identifiers::TenantId;
use crate::interfaces::UsageError;
use crate::interfaces::UsageEvent;
use crate::interfaces::UsageMeter;

// ============================================================================
// SECTION: Meters
// ============================================================================

/// Usage meter that discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUsageMeter;

impl UsageMeter for NoopUsageMeter {
    fn record(&self, _event: &UsageEvent) -> Result<(), UsageError> {
        Ok(())
    }
}

/// Usage meter that keeps records and per-tenant totals in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUsageMeter {
    /// Recorded events and totals.
    state: Arc<Mutex<UsageLedger>>,
}

/// Recorded usage.
#[derive(Debug, Default)]
struct UsageLedger {
    /// Events in record order.
    events: Vec<UsageEvent>,
    /// Units per tenant.
    totals: BTreeMap<TenantId, u64>,
}

impl InMemoryUsageMeter {
    /// Creates an empty meter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<UsageEvent> {
        self.state.lock().map(|guard| guard.events.clone()).unwrap_or_default()
    }

    /// Returns total units recorded for a tenant.
    #[must_use]
    pub fn total_for(&self, tenant_id: &TenantId) -> u64 {
        self.state
            .lock()
            .ok()
            .and_then(|guard| guard.totals.get(tenant_id).copied())
            .unwrap_or(0)
    }
}

impl UsageMeter for InMemoryUsageMeter {
    fn record(&self, event: &UsageEvent) -> Result<(), UsageError> {
        let mut guard =
            self.state.lock().map_err(|_| UsageError::Meter("usage meter mutex poisoned".to_string()))?;
        let total = guard.totals.entry(event.tenant_id.clone()).or_insert(0);
        *total = total.saturating_add(event.units);
        guard.events.push(event.clone());
        Ok(())
    }
}
