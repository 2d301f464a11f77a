//! Orchestration for a cycle-start call.
//!
//! A work cycle begins only if the admission gate would admit it: when the
//! budget is already exhausted the cycle is refused, the tracker does not
//! advance, and the handoff runs instead.

use std::path::Path;

use anyhow::Result;

use crate::core::gate::evaluate;
use crate::core::types::{ActionKind, Decision, SessionStatus};
use crate::handoff::run_handoff;
use crate::io::checkpoint::Checkpoint;
use crate::io::config::ResolvedConfig;
use crate::io::guardrails::load_guardrails;
use crate::io::init::BatonPaths;
use crate::io::ledger::load_ledger;
use crate::io::protocol::FlowResponse;
use crate::io::session::{advance, load_session};
use crate::io::spawner::WorkerSpawner;

/// Start one work cycle and return the wire response.
pub fn start_cycle<C: Checkpoint, S: WorkerSpawner>(
    root: &Path,
    resolved: &ResolvedConfig,
    checkpoint: &C,
    spawner: &S,
) -> Result<FlowResponse> {
    let paths = BatonPaths::new(root);
    let cfg = &resolved.config;

    let session = load_session(&paths.session_path);
    if session.status == SessionStatus::Complete {
        return Ok(FlowResponse {
            continue_: false,
            followup_message: Some("task is complete; no further iterations".to_string()),
            agent_message: None,
        });
    }

    let ledger = load_ledger(&paths.ledger_path, cfg.threshold, cfg.warn_fraction);
    let decision = evaluate(
        ledger.allocated,
        cfg.threshold,
        cfg.warn_fraction,
        ActionKind::Other,
    );
    if let Decision::Deny { reason } = &decision {
        let outcome = run_handoff(root, resolved, checkpoint, spawner)?;
        return Ok(FlowResponse {
            continue_: false,
            followup_message: Some(outcome.message),
            agent_message: Some(reason.clone()),
        });
    }

    let record = advance(&paths.session_path)?;
    let guardrails = load_guardrails(&paths.guardrails_path);

    let mut message = format!(
        "iteration {} started; {} of {} budget units allocated",
        record.iteration, ledger.allocated, cfg.threshold
    );
    if let Decision::AllowWithWarning { remaining } = decision {
        message.push_str(&format!(" ({remaining} remaining before handoff)"));
    }
    if let Some(previous) = record.previous_context {
        message.push_str(&format!(
            "; previous session handed off at {previous} units"
        ));
    }
    if !guardrails.is_empty() {
        message.push_str("\nguardrails:");
        for rule in &guardrails {
            message.push_str(&format!("\n- {rule}"));
        }
    }

    Ok(FlowResponse {
        continue_: true,
        followup_message: None,
        agent_message: Some(message),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gate::DEFAULT_WARN_FRACTION;
    use crate::io::config::{BatonConfig, Continuation};
    use crate::io::ledger::record;
    use crate::io::session::{SessionRecord, write_session};
    use crate::test_support::{RecordingCheckpoint, RecordingSpawner, init_workspace};

    fn resolved() -> ResolvedConfig {
        ResolvedConfig {
            config: BatonConfig::default(),
            continuation: Continuation::Local,
        }
    }

    #[test]
    fn first_cycle_activates_iteration_one() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_workspace(temp.path());

        let response = start_cycle(
            temp.path(),
            &resolved(),
            &RecordingCheckpoint::default(),
            &RecordingSpawner::default(),
        )
        .expect("cycle");

        assert!(response.continue_);
        let message = response.agent_message.expect("message");
        assert!(message.contains("iteration 1 started"));

        let session = load_session(&paths.session_path);
        assert_eq!(session.iteration, 1);
        assert_eq!(session.status, SessionStatus::Active);
    }

    #[test]
    fn cycle_surfaces_guardrails() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_workspace(temp.path());
        std::fs::write(&paths.guardrails_path, "- keep commits small\n").expect("write");

        let response = start_cycle(
            temp.path(),
            &resolved(),
            &RecordingCheckpoint::default(),
            &RecordingSpawner::default(),
        )
        .expect("cycle");

        assert!(
            response
                .agent_message
                .expect("message")
                .contains("keep commits small")
        );
    }

    /// Exhausted budget refuses the cycle: the tracker must not advance and
    /// the handoff runs instead.
    #[test]
    fn exhausted_budget_refuses_cycle_without_advancing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_workspace(temp.path());
        crate::io::session::advance(&paths.session_path).expect("advance");
        record(&paths.ledger_path, 80_000, DEFAULT_WARN_FRACTION, 80_000).expect("record");

        let checkpoint = RecordingCheckpoint::default();
        let response = start_cycle(
            temp.path(),
            &resolved(),
            &checkpoint,
            &RecordingSpawner::default(),
        )
        .expect("cycle");

        assert!(!response.continue_);
        assert_eq!(checkpoint.persisted.get(), 1);
        // Handoff marked the session pending; no advance happened.
        let session = load_session(&paths.session_path);
        assert_eq!(session.iteration, 1);
        assert_eq!(session.status, SessionStatus::HandoffPending);
    }

    #[test]
    fn completed_session_refuses_further_cycles() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_workspace(temp.path());
        write_session(
            &paths.session_path,
            &SessionRecord {
                iteration: 4,
                status: SessionStatus::Complete,
                started_at: None,
                previous_context: None,
            },
        )
        .expect("write");

        let response = start_cycle(
            temp.path(),
            &resolved(),
            &RecordingCheckpoint::default(),
            &RecordingSpawner::default(),
        )
        .expect("cycle");

        assert!(!response.continue_);
        assert_eq!(load_session(&paths.session_path).iteration, 4);
    }

    #[test]
    fn resumed_cycle_after_handoff_reports_previous_context() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_workspace(temp.path());
        write_session(
            &paths.session_path,
            &SessionRecord {
                iteration: 3,
                status: SessionStatus::HandoffPending,
                started_at: None,
                previous_context: Some(80_200),
            },
        )
        .expect("write");

        let response = start_cycle(
            temp.path(),
            &resolved(),
            &RecordingCheckpoint::default(),
            &RecordingSpawner::default(),
        )
        .expect("cycle");

        assert!(response.continue_);
        let message = response.agent_message.expect("message");
        assert!(message.contains("iteration 4 started"));
        assert!(message.contains("80200"));
    }
}
