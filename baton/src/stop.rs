//! Orchestration for a session-stop call.
//!
//! A stop event either drives a handoff (budget exhausted) or completion
//! verification (criteria + optional test command). Not-complete outcomes
//! ask the host loop to continue; complete outcomes checkpoint once more and
//! make the session record terminal.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::core::types::SessionStatus;
use crate::core::verify::{VerifyOutcome, classify_completion};
use crate::handoff::run_handoff;
use crate::io::checkpoint::Checkpoint;
use crate::io::config::ResolvedConfig;
use crate::io::init::BatonPaths;
use crate::io::ledger::load_ledger;
use crate::io::protocol::{EventRequest, FlowResponse};
use crate::io::session::{SessionRecord, load_session, write_session};
use crate::io::spawner::WorkerSpawner;
use crate::io::task::load_task;
use crate::io::verifier::{VerifyRequest, run_test_command};

/// Marker in `event_status` for a stop that baton already blocked once.
const FOLLOWUP_EVENT: &str = "followup";

/// Handle one session-stop event and return the wire response.
pub fn handle_stop<C: Checkpoint, S: WorkerSpawner>(
    root: &Path,
    resolved: &ResolvedConfig,
    request: &EventRequest,
    checkpoint: &C,
    spawner: &S,
) -> Result<FlowResponse> {
    let paths = BatonPaths::new(root);
    let cfg = &resolved.config;

    let session = load_session(&paths.session_path);
    if session.status == SessionStatus::Complete {
        return Ok(FlowResponse {
            continue_: false,
            followup_message: Some("task already complete".to_string()),
            agent_message: None,
        });
    }

    let ledger = load_ledger(&paths.ledger_path, cfg.threshold, cfg.warn_fraction);
    if session.status == SessionStatus::HandoffPending || ledger.allocated >= cfg.threshold {
        let outcome = run_handoff(root, resolved, checkpoint, spawner)?;
        return Ok(FlowResponse {
            continue_: false,
            followup_message: Some(outcome.message),
            agent_message: None,
        });
    }

    let Some(task) = load_task(&paths.task_path)? else {
        warn!(path = %paths.task_path.display(), "no task document, nothing to verify");
        return Ok(FlowResponse {
            continue_: false,
            followup_message: Some("no task document found; nothing to verify".to_string()),
            agent_message: None,
        });
    };
    if task.criteria.is_empty() {
        return Ok(FlowResponse {
            continue_: false,
            followup_message: Some(
                "task document lists no acceptance criteria; nothing to verify".to_string(),
            ),
            agent_message: None,
        });
    }

    let unchecked = task.unchecked_count();
    let test = if unchecked == 0
        && let Some(command) = &task.test_command
    {
        Some(run_test_command(&VerifyRequest {
            workdir: root.to_path_buf(),
            command: command.clone(),
            timeout: Duration::from_secs(cfg.verify.timeout_secs),
            output_limit_bytes: cfg.verify.output_limit_bytes,
        })?)
    } else {
        None
    };

    // A stop we already blocked once reports again but does not re-block,
    // bounding the feedback loop.
    let already_blocked = request.event_status.as_deref() == Some(FOLLOWUP_EVENT);

    match classify_completion(unchecked, task.criteria.len(), test.as_ref()) {
        VerifyOutcome::CriteriaRemaining { unchecked, total } => Ok(FlowResponse {
            continue_: !already_blocked,
            followup_message: None,
            agent_message: Some(format!(
                "{unchecked} of {total} acceptance criteria remain unchecked in the task document"
            )),
        }),
        VerifyOutcome::TestContradiction { output } => Ok(FlowResponse {
            continue_: !already_blocked,
            followup_message: None,
            agent_message: Some(format!(
                "all criteria are checked but the verification command failed:\n{output}"
            )),
        }),
        outcome @ (VerifyOutcome::CompleteUnverified | VerifyOutcome::CompleteVerified) => {
            if let Err(err) = checkpoint.persist(&format!(
                "chore(baton): final checkpoint, iteration {} complete",
                session.iteration
            )) {
                warn!(%err, "final checkpoint failed");
            }
            write_session(
                &paths.session_path,
                &SessionRecord {
                    status: SessionStatus::Complete,
                    ..session
                },
            )?;
            let verified = outcome == VerifyOutcome::CompleteVerified;
            info!(verified, "session complete");
            Ok(FlowResponse {
                continue_: false,
                followup_message: Some(if verified {
                    "task complete (verified)".to_string()
                } else {
                    "task complete (unverified: no test command configured)".to_string()
                }),
                agent_message: None,
            })
        }
    }
}
