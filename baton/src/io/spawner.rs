//! Worker-spawn capability for remote continuation.
//!
//! The transport behind the spawn is opaque to baton: success means a fresh
//! worker process was launched, nothing more. Failure is a
//! [`CapabilityError`] the handoff orchestrator downgrades to local mode.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::errors::CapabilityError;
use crate::io::config::REMOTE_TOKEN_ENV;

/// Parameters for spawning a fresh worker after a handoff.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    /// Workspace the worker should continue in.
    pub workdir: PathBuf,
    /// Iteration the worker is expected to run.
    pub next_iteration: u32,
    /// Credential proving auto-continuation is configured.
    pub token: String,
    /// Worker command line (program + leading args) from configuration.
    pub command: Vec<String>,
}

/// Abstraction over worker spawn backends.
pub trait WorkerSpawner {
    fn spawn(&self, request: &SpawnRequest) -> Result<(), CapabilityError>;
}

/// Spawner that launches the configured worker command detached.
pub struct ProcessSpawner;

impl WorkerSpawner for ProcessSpawner {
    fn spawn(&self, request: &SpawnRequest) -> Result<(), CapabilityError> {
        let Some((program, args)) = request.command.split_first() else {
            return Err(CapabilityError::new("spawn", "worker command not configured"));
        };
        debug!(program, next_iteration = request.next_iteration, "spawning fresh worker");

        let resume_prompt = format!(
            "Resume iteration {}: read .baton/TASK.md and continue the task.",
            request.next_iteration
        );
        // Detached: the worker outlives this invocation, so we do not wait.
        let child = Command::new(program)
            .args(args)
            .arg(resume_prompt)
            .current_dir(&request.workdir)
            .env(REMOTE_TOKEN_ENV, &request.token)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| CapabilityError::new("spawn", err.to_string()))?;

        info!(pid = child.id(), "worker spawned");
        Ok(())
    }
}
