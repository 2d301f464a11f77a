//! Persisted budget ledger (`.baton/state/ledger.json`).
//!
//! The ledger is shared mutable state across independent process invocations,
//! so every mutation is a single read-modify-write ending in an atomic
//! rename-swap; no partial write is ever observable. Loading fails open: a
//! missing, unreadable, or malformed file meters from zero rather than
//! failing the caller. That availability-over-consistency tradeoff is
//! deliberate and must be preserved.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::gate::budget_status;
use crate::core::types::BudgetStatus;

/// Persisted counter of consumed budget units plus derived health status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BudgetLedger {
    /// Consumed budget units. Monotonically non-decreasing within a session;
    /// reset to 0 only when a handoff completes.
    pub allocated: u64,
    pub threshold: u64,
    pub status: BudgetStatus,
}

impl BudgetLedger {
    pub fn empty(threshold: u64) -> Self {
        Self {
            allocated: 0,
            threshold,
            status: BudgetStatus::Healthy,
        }
    }
}

/// Load the ledger, failing open on any read or parse problem.
///
/// The configured threshold is authoritative; the persisted copy exists for
/// observability and is overridden (with the status recomputed) on load.
pub fn load_ledger(path: &Path, threshold: u64, warn_fraction: f64) -> BudgetLedger {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            debug!(path = %path.display(), %err, "no readable ledger, metering from zero");
            return BudgetLedger::empty(threshold);
        }
    };
    match serde_json::from_str::<BudgetLedger>(&contents) {
        Ok(mut ledger) => {
            ledger.threshold = threshold;
            ledger.status = budget_status(ledger.allocated, threshold, warn_fraction);
            ledger
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "corrupt ledger, metering from zero");
            BudgetLedger::empty(threshold)
        }
    }
}

/// Add an estimated cost to the ledger and persist the result.
///
/// The updated value is on disk before this returns, so no later read can
/// observe a snapshot lower than the true accumulated cost.
pub fn record(path: &Path, threshold: u64, warn_fraction: f64, cost: u64) -> Result<BudgetLedger> {
    let mut ledger = load_ledger(path, threshold, warn_fraction);
    ledger.allocated = ledger.allocated.saturating_add(cost);
    ledger.status = budget_status(ledger.allocated, threshold, warn_fraction);
    write_ledger(path, &ledger)?;
    debug!(allocated = ledger.allocated, cost, "recorded action cost");
    Ok(ledger)
}

/// Reset the ledger to empty: a fresh worker starts with no allocation.
/// Used only when a handoff completes.
pub fn reset(path: &Path, threshold: u64) -> Result<BudgetLedger> {
    let ledger = BudgetLedger::empty(threshold);
    write_ledger(path, &ledger)?;
    Ok(ledger)
}

/// Atomically write the ledger to disk (temp file + rename).
pub fn write_ledger(path: &Path, ledger: &BudgetLedger) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(ledger)?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("ledger path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp ledger {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace ledger {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gate::DEFAULT_WARN_FRACTION;

    const THRESHOLD: u64 = 80_000;

    fn ledger_path(temp: &tempfile::TempDir) -> std::path::PathBuf {
        temp.path().join("ledger.json")
    }

    #[test]
    fn first_record_goes_from_zero_to_cost() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = ledger_path(&temp);

        let ledger = record(&path, THRESHOLD, DEFAULT_WARN_FRACTION, 5_000).expect("record");
        assert_eq!(ledger.allocated, 5_000);
        assert_eq!(ledger.status, BudgetStatus::Healthy);

        // Persisted before the caller observed the update.
        let reloaded = load_ledger(&path, THRESHOLD, DEFAULT_WARN_FRACTION);
        assert_eq!(reloaded.allocated, 5_000);
    }

    #[test]
    fn repeated_records_accumulate_and_cross_bands() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = ledger_path(&temp);

        for _ in 0..13 {
            record(&path, THRESHOLD, DEFAULT_WARN_FRACTION, 5_000).expect("record");
        }
        let ledger = load_ledger(&path, THRESHOLD, DEFAULT_WARN_FRACTION);
        assert_eq!(ledger.allocated, 65_000);
        assert_eq!(ledger.status, BudgetStatus::Warning);

        let ledger = record(&path, THRESHOLD, DEFAULT_WARN_FRACTION, 16_000).expect("record");
        assert_eq!(ledger.status, BudgetStatus::Critical);
    }

    #[test]
    fn corrupt_ledger_fails_open_to_zero() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = ledger_path(&temp);
        fs::write(&path, "{not json").expect("write");

        let ledger = load_ledger(&path, THRESHOLD, DEFAULT_WARN_FRACTION);
        assert_eq!(ledger.allocated, 0);
        assert_eq!(ledger.status, BudgetStatus::Healthy);
    }

    #[test]
    fn missing_ledger_fails_open_to_zero() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ledger = load_ledger(&ledger_path(&temp), THRESHOLD, DEFAULT_WARN_FRACTION);
        assert_eq!(ledger.allocated, 0);
    }

    #[test]
    fn reset_returns_to_empty_and_persists() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = ledger_path(&temp);
        record(&path, THRESHOLD, DEFAULT_WARN_FRACTION, 90_000).expect("record");

        reset(&path, THRESHOLD).expect("reset");
        let ledger = load_ledger(&path, THRESHOLD, DEFAULT_WARN_FRACTION);
        assert_eq!(ledger, BudgetLedger::empty(THRESHOLD));
    }

    #[test]
    fn configured_threshold_overrides_persisted_copy() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = ledger_path(&temp);
        record(&path, THRESHOLD, DEFAULT_WARN_FRACTION, 50_000).expect("record");

        // Re-load under a tighter threshold: allocation kept, band recomputed.
        let ledger = load_ledger(&path, 50_000, DEFAULT_WARN_FRACTION);
        assert_eq!(ledger.allocated, 50_000);
        assert_eq!(ledger.threshold, 50_000);
        assert_eq!(ledger.status, BudgetStatus::Critical);
    }
}
