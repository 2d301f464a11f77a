//! Handoff orchestration: checkpoint current work, mark the session, reset
//! the ledger, and hand continuation to a fresh worker (remote) or a human
//! (local).
//!
//! Once the checkpoint step begins the handoff always runs to completion;
//! a partial checkpoint risks silent work loss.

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::core::types::SessionStatus;
use crate::io::checkpoint::Checkpoint;
use crate::io::config::{Continuation, ResolvedConfig};
use crate::io::init::BatonPaths;
use crate::io::ledger::{load_ledger, reset};
use crate::io::session::{SessionRecord, load_session, write_session};
use crate::io::spawner::{SpawnRequest, WorkerSpawner};

/// How continuation was arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffMode {
    /// A fresh worker was spawned automatically.
    Remote,
    /// A human must resume manually.
    Local,
}

/// Result of a handoff invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffOutcome {
    pub mode: HandoffMode,
    /// Iteration the continuation is expected to run.
    pub next_iteration: u32,
    /// Whether the best-effort checkpoint actually created one.
    pub checkpointed: bool,
    /// Human/agent-facing instruction describing what happens next.
    pub message: String,
}

/// Run the handoff state machine against the persisted session and ledger.
///
/// Idempotent in effect: a duplicate invocation (the record is already
/// `HandoffPending`) reports the pending handoff without checkpointing,
/// resetting, or spawning again, so a doubled stop event can neither
/// double-reset the ledger nor skip an iteration number.
pub fn run_handoff<C: Checkpoint, S: WorkerSpawner>(
    root: &Path,
    resolved: &ResolvedConfig,
    checkpoint: &C,
    spawner: &S,
) -> Result<HandoffOutcome> {
    let paths = BatonPaths::new(root);
    let cfg = &resolved.config;
    let session = load_session(&paths.session_path);

    if session.status == SessionStatus::HandoffPending {
        // The first invocation already arranged continuation (or fell back
        // to local); report the pending state without claiming either mode.
        let next_iteration = session.iteration + 1;
        return Ok(HandoffOutcome {
            mode: HandoffMode::Local,
            next_iteration,
            checkpointed: false,
            message: format!(
                "handoff already pending; resume at iteration {next_iteration}"
            ),
        });
    }

    let ledger = load_ledger(&paths.ledger_path, cfg.threshold, cfg.warn_fraction);
    let allocated_at_handoff = ledger.allocated;

    let checkpointed = match checkpoint.persist(&checkpoint_message(
        session.iteration,
        allocated_at_handoff,
    )) {
        Ok(created) => created,
        Err(err) => {
            warn!(%err, "checkpoint failed during handoff, continuing");
            false
        }
    };

    let pending = SessionRecord {
        iteration: session.iteration,
        status: SessionStatus::HandoffPending,
        started_at: session.started_at,
        previous_context: Some(allocated_at_handoff),
    };
    write_session(&paths.session_path, &pending)?;
    reset(&paths.ledger_path, cfg.threshold)?;

    let next_iteration = session.iteration + 1;
    if let Continuation::Remote { token } = &resolved.continuation {
        let request = SpawnRequest {
            workdir: root.to_path_buf(),
            next_iteration,
            token: token.clone(),
            command: cfg.remote.worker_command.clone(),
        };
        match spawner.spawn(&request) {
            Ok(()) => {
                // The fresh worker continues mid-cycle; writing its Active
                // record here stands in for its cycle-start, keeping
                // iteration numbers gapless.
                let active = SessionRecord {
                    iteration: next_iteration,
                    status: SessionStatus::Active,
                    started_at: Some(Utc::now()),
                    previous_context: Some(allocated_at_handoff),
                };
                write_session(&paths.session_path, &active)?;
                info!(next_iteration, "handoff complete, fresh worker spawned");
                return Ok(HandoffOutcome {
                    mode: HandoffMode::Remote,
                    next_iteration,
                    checkpointed,
                    message: format!(
                        "budget exhausted at {allocated_at_handoff} units; work checkpointed \
                         and a fresh worker was spawned for iteration {next_iteration}"
                    ),
                });
            }
            Err(err) => {
                warn!(%err, "worker spawn failed, falling back to local resume");
            }
        }
    }

    info!(next_iteration, "handoff complete, awaiting manual resume");
    Ok(HandoffOutcome {
        mode: HandoffMode::Local,
        next_iteration,
        checkpointed,
        message: resume_instruction(next_iteration),
    })
}

fn resume_instruction(next_iteration: u32) -> String {
    format!(
        "budget exhausted; work has been checkpointed. Start a fresh session \
         and run iteration {next_iteration}."
    )
}

fn checkpoint_message(iteration: u32, allocated: u64) -> String {
    format!("chore(baton): checkpoint iteration {iteration} at {allocated} budget units")
}
