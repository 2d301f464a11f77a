//! Typed errors for the external capability seams.

use thiserror::Error;

/// Failure of a best-effort external capability (checkpoint persist or worker
/// spawn).
///
/// Capability calls never propagate as hard errors: the orchestrator logs the
/// failure and pattern-matches into its fallback path (e.g. instruct a human
/// to resume instead of spawning a worker).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{capability} capability unavailable: {reason}")]
pub struct CapabilityError {
    pub capability: &'static str,
    pub reason: String,
}

impl CapabilityError {
    pub fn new(capability: &'static str, reason: impl Into<String>) -> Self {
        Self {
            capability,
            reason: reason.into(),
        }
    }
}
