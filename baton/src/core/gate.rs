//! Pure admission-gate decision logic.
//!
//! The gate decides from the pre-action allocation total; the admitted
//! action's own cost is recorded afterwards and only affects the next
//! decision.

use crate::core::types::{ActionKind, BudgetStatus, Decision};

/// Fraction of the threshold at which warnings begin.
pub const DEFAULT_WARN_FRACTION: f64 = 0.8;

/// Compute the ledger health band for an allocation against a threshold.
pub fn budget_status(allocated: u64, threshold: u64, warn_fraction: f64) -> BudgetStatus {
    if allocated >= threshold {
        BudgetStatus::Critical
    } else if allocated >= warn_level(threshold, warn_fraction) {
        BudgetStatus::Warning
    } else {
        BudgetStatus::Healthy
    }
}

/// Decide whether a proposed action is admitted under the current allocation.
///
/// The exemption check runs before the deny short-circuit so checkpoint
/// actions stay possible arbitrarily deep over budget. The threshold boundary
/// is inclusive: a non-exempt action at exactly `allocated == threshold` is
/// already denied.
pub fn evaluate(allocated: u64, threshold: u64, warn_fraction: f64, kind: ActionKind) -> Decision {
    if kind.is_exempt() {
        return Decision::Allow;
    }
    if allocated >= threshold {
        return Decision::Deny {
            reason: format!("budget exhausted: {allocated} of {threshold} units allocated"),
        };
    }
    if allocated >= warn_level(threshold, warn_fraction) {
        return Decision::AllowWithWarning {
            remaining: threshold - allocated,
        };
    }
    Decision::Allow
}

fn warn_level(threshold: u64, warn_fraction: f64) -> u64 {
    (threshold as f64 * warn_fraction).floor() as u64
}
