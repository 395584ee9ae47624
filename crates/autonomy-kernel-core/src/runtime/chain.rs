// crates/autonomy-kernel-core/src/runtime/chain.rs
// ============================================================================
// Module: Receipt Chain Verification
// Description: Offline verification of session-chained receipts.
// Purpose: Let auditors confirm receipt signatures and causal linkage.
// Dependencies: crate::{core, interfaces}, serde
// ============================================================================

//! ## Overview
//! [`verify_receipt_chain`] checks an ordered list of receipts from one
//! session: every signature verifies, the first receipt starts at `GENESIS`
//! with clock 1, and each later receipt links to its predecessor's signature
//! with a clock exactly one higher. Every problem is reported, not only the
//! first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::custody::GENESIS_LAMPORT_CLOCK;
use crate::core::custody::GENESIS_PREV_HASH;
use crate::core::custody::Receipt;
use crate::core::identifiers::ReceiptId;
use crate::interfaces::Verifier;

// ============================================================================
// SECTION: Report
// ============================================================================

/// One chain verification problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainIssue {
    /// Position in the supplied list.
    pub index: usize,
    /// Offending receipt.
    pub receipt_id: ReceiptId,
    /// Problem description.
    pub message: String,
}

/// Chain verification outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    /// True when no issues were found.
    pub valid: bool,
    /// Number of receipts checked.
    pub checked: usize,
    /// Every issue found.
    pub issues: Vec<ChainIssue>,
}

// ============================================================================
// SECTION: Verification
// ============================================================================

/// Verifies signatures and linkage of receipts ordered by lamport clock.
#[must_use]
pub fn verify_receipt_chain(receipts: &[Receipt], verifier: &dyn Verifier) -> ChainReport {
    let mut issues = Vec::new();
    let mut previous: Option<&Receipt> = None;
    for (index, receipt) in receipts.iter().enumerate() {
        let mut report = |message: String| {
            issues.push(ChainIssue {
                index,
                receipt_id: receipt.receipt_id.clone(),
                message,
            });
        };
        match verifier.verify_receipt(receipt) {
            Ok(true) => {}
            Ok(false) => report("signature does not verify".to_string()),
            Err(err) => report(format!("signature check failed: {err}")),
        }
        match previous {
            None => {
                if receipt.prev_hash != GENESIS_PREV_HASH {
                    report(format!("first receipt must link to {GENESIS_PREV_HASH}"));
                }
                if receipt.lamport_clock != GENESIS_LAMPORT_CLOCK {
                    report(format!(
                        "first receipt clock {} != {GENESIS_LAMPORT_CLOCK}",
                        receipt.lamport_clock
                    ));
                }
            }
            Some(prev) => {
                if receipt.session_id != prev.session_id {
                    report("receipt belongs to a different session".to_string());
                }
                if receipt.prev_hash != prev.signature {
                    report(format!("prev_hash does not match signature of {}", prev.receipt_id));
                }
                if prev.lamport_clock.checked_add(1) != Some(receipt.lamport_clock) {
                    report(format!(
                        "clock {} does not follow {}",
                        receipt.lamport_clock, prev.lamport_clock
                    ));
                }
            }
        }
        previous = Some(receipt);
    }
    ChainReport {
        valid: issues.is_empty(),
        checked: receipts.len(),
        issues,
    }
}
