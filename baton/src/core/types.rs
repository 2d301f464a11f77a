//! Shared deterministic types for gate and session decisions.
//!
//! These types define stable contracts between core components. They should not
//! depend on external state or I/O and must remain deterministic across runs.

use serde::{Deserialize, Serialize};

/// Health band of the budget ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// Below the warning band.
    Healthy,
    /// At or above the warning band, below the threshold.
    Warning,
    /// At or above the threshold.
    Critical,
}

/// Lifecycle status of the persisted session record.
///
/// Transitions form a DAG: `Initialized -> Active`, `Active -> Active` across
/// work cycles, `Active -> HandoffPending`, `HandoffPending -> Active` (next
/// iteration), and `Active -> Complete`. `Complete` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Initialized,
    Active,
    HandoffPending,
    Complete,
}

/// Typed category for a gated action.
///
/// Exemption from budget denial is a fixed property of the kind, not a
/// free-text pattern match: only `Persist` actions (checkpointing work) stay
/// allow-able once the budget is exhausted, so work can always be saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Saves work (e.g. `git commit`). Exempt and never metered.
    Persist,
    /// Reads state without changing it.
    Inspect,
    /// Changes files or system state.
    Mutate,
    /// Anything the classifier cannot bucket.
    Other,
}

impl ActionKind {
    pub fn is_exempt(self) -> bool {
        matches!(self, ActionKind::Persist)
    }

    /// Metered actions consume budget when admitted.
    pub fn is_metered(self) -> bool {
        !self.is_exempt()
    }
}

/// Admission decision for a proposed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Admitted, but the remaining budget is below the warning band.
    AllowWithWarning { remaining: u64 },
    Deny { reason: String },
}
