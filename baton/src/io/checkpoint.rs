//! Checkpoint ("persist") capability.
//!
//! Invoked best-effort by the handoff orchestrator and on completion; a
//! failure is reported as a [`CapabilityError`] for the caller to
//! pattern-match, never swallowed and never fatal.

use std::path::Path;

use crate::errors::CapabilityError;
use crate::io::git::Git;

/// Abstraction over work persistence backends.
pub trait Checkpoint {
    /// Persist any uncommitted work under `message`.
    ///
    /// Returns `Ok(true)` if a checkpoint was created, `Ok(false)` if there
    /// was nothing to save.
    fn persist(&self, message: &str) -> Result<bool, CapabilityError>;
}

/// Checkpoint implementation that stages and commits via git.
pub struct GitCheckpoint {
    git: Git,
}

impl GitCheckpoint {
    pub fn new(workdir: &Path) -> Self {
        Self {
            git: Git::new(workdir),
        }
    }
}

impl Checkpoint for GitCheckpoint {
    fn persist(&self, message: &str) -> Result<bool, CapabilityError> {
        self.git
            .add_all()
            .map_err(|err| CapabilityError::new("persist", err.to_string()))?;
        self.git
            .commit_staged(message)
            .map_err(|err| CapabilityError::new("persist", err.to_string()))
    }
}
