//! Orchestration for a single content-gating call.
//!
//! Classifies the proposed action, evaluates it against the pre-action
//! ledger total, meters admitted actions, and drives a handoff when the
//! gate denies a non-exempt action.

use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::core::classify::classify;
use crate::core::estimate::{action_size, estimate_cost};
use crate::core::gate::evaluate;
use crate::core::types::{Decision, SessionStatus};
use crate::handoff::run_handoff;
use crate::io::checkpoint::Checkpoint;
use crate::io::config::ResolvedConfig;
use crate::io::init::BatonPaths;
use crate::io::ledger::{load_ledger, record};
use crate::io::protocol::{GateRequest, GateResponse, Permission};
use crate::io::session::load_session;
use crate::io::spawner::WorkerSpawner;

/// Gate one action and return the wire response.
pub fn admit_action<C: Checkpoint, S: WorkerSpawner>(
    root: &Path,
    resolved: &ResolvedConfig,
    request: &GateRequest,
    checkpoint: &C,
    spawner: &S,
) -> Result<GateResponse> {
    let paths = BatonPaths::new(root);
    let cfg = &resolved.config;

    // Complete is terminal: nothing left to meter and no handoff to drive,
    // whatever the ledger says.
    let session = load_session(&paths.session_path);
    if session.status == SessionStatus::Complete {
        return Ok(GateResponse {
            permission: Permission::Allow,
            user_message: None,
            agent_message: Some("task is already complete; stop".to_string()),
        });
    }

    let ledger = load_ledger(&paths.ledger_path, cfg.threshold, cfg.warn_fraction);
    let kind = classify(&request.command_or_path);
    let decision = evaluate(ledger.allocated, cfg.threshold, cfg.warn_fraction, kind);
    debug!(?kind, ?decision, allocated = ledger.allocated, "gate decision");

    match decision {
        Decision::Allow => {
            let agent_message = if kind.is_exempt() && ledger.allocated >= cfg.threshold {
                // The one path that stays open over budget: let the work be
                // saved, then stop.
                Some(format!(
                    "budget exhausted ({} of {} units); finish this checkpoint, then stop",
                    ledger.allocated, cfg.threshold
                ))
            } else {
                None
            };
            meter(&paths, resolved, request)?;
            Ok(GateResponse {
                permission: Permission::Allow,
                user_message: None,
                agent_message,
            })
        }
        Decision::AllowWithWarning { remaining } => {
            meter(&paths, resolved, request)?;
            Ok(GateResponse {
                permission: Permission::Allow,
                user_message: Some(format!("budget warning: {remaining} units remaining")),
                agent_message: Some(
                    "budget is running low; checkpoint soon and prepare to stop".to_string(),
                ),
            })
        }
        Decision::Deny { reason } => {
            let outcome = run_handoff(root, resolved, checkpoint, spawner)?;
            Ok(GateResponse {
                permission: Permission::Deny,
                user_message: Some(reason),
                agent_message: Some(outcome.message),
            })
        }
    }
}

/// Record the admitted action's estimated cost. Exempt actions are never
/// metered; the denied path never reaches here because a denied action does
/// not execute.
fn meter(paths: &BatonPaths, resolved: &ResolvedConfig, request: &GateRequest) -> Result<()> {
    let kind = classify(&request.command_or_path);
    if !kind.is_metered() {
        return Ok(());
    }
    let cfg = &resolved.config;
    let size = action_size(
        request.content_or_size_hint.as_deref(),
        &request.command_or_path,
    );
    let cost = estimate_cost(size, cfg.chars_per_token, cfg.context_multiplier);
    record(&paths.ledger_path, cfg.threshold, cfg.warn_fraction, cost)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::gate::DEFAULT_WARN_FRACTION;
    use crate::core::types::SessionStatus;
    use crate::io::config::{BatonConfig, Continuation};
    use crate::io::session::load_session;
    use crate::test_support::{RecordingCheckpoint, RecordingSpawner, init_workspace};

    fn resolved() -> ResolvedConfig {
        ResolvedConfig {
            config: BatonConfig::default(),
            continuation: Continuation::Local,
        }
    }

    fn gate_request(command: &str, hint: Option<&str>, root: &Path) -> GateRequest {
        GateRequest {
            command_or_path: command.to_string(),
            content_or_size_hint: hint.map(str::to_string),
            workspace_root: root.to_path_buf(),
            event_status: None,
        }
    }

    fn set_allocated(paths: &crate::io::init::BatonPaths, allocated: u64) {
        record(&paths.ledger_path, 80_000, DEFAULT_WARN_FRACTION, allocated).expect("record");
    }

    /// An admitted read is metered after the decision: the gate saw the
    /// pre-action total and the ledger now carries the action's cost.
    #[test]
    fn admitted_action_is_metered_after_decision() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_workspace(temp.path());
        let request = gate_request("cat notes.md", Some("5000"), temp.path());

        let response = admit_action(
            temp.path(),
            &resolved(),
            &request,
            &RecordingCheckpoint::default(),
            &RecordingSpawner::default(),
        )
        .expect("admit");

        assert_eq!(response.permission, Permission::Allow);
        assert_eq!(response.user_message, None);
        let ledger = load_ledger(&paths.ledger_path, 80_000, DEFAULT_WARN_FRACTION);
        assert_eq!(ledger.allocated, 5_000);
    }

    #[test]
    fn warning_band_reports_remaining_budget() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_workspace(temp.path());
        set_allocated(&paths, 65_000);

        let request = gate_request("cat notes.md", Some("400"), temp.path());
        let response = admit_action(
            temp.path(),
            &resolved(),
            &request,
            &RecordingCheckpoint::default(),
            &RecordingSpawner::default(),
        )
        .expect("admit");

        assert_eq!(response.permission, Permission::Allow);
        assert_eq!(
            response.user_message.as_deref(),
            Some("budget warning: 15000 units remaining")
        );
        // The warned action is still metered for the next decision.
        let ledger = load_ledger(&paths.ledger_path, 80_000, DEFAULT_WARN_FRACTION);
        assert_eq!(ledger.allocated, 65_400);
    }

    /// Over budget: a non-exempt action is denied and the handoff runs; the
    /// denied action's cost is never recorded.
    #[test]
    fn deny_over_budget_triggers_handoff() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_workspace(temp.path());
        crate::io::session::advance(&paths.session_path).expect("advance");
        set_allocated(&paths, 81_000);

        let checkpoint = RecordingCheckpoint::default();
        let request = gate_request("rm -rf /tmp/x", None, temp.path());
        let response = admit_action(
            temp.path(),
            &resolved(),
            &request,
            &checkpoint,
            &RecordingSpawner::default(),
        )
        .expect("admit");

        assert_eq!(response.permission, Permission::Deny);
        assert!(response.user_message.unwrap().contains("budget exhausted"));
        assert_eq!(checkpoint.persisted.get(), 1);
        assert_eq!(
            load_session(&paths.session_path).status,
            SessionStatus::HandoffPending
        );
        // Handoff reset the ledger; the denied cost was never added.
        let ledger = load_ledger(&paths.ledger_path, 80_000, DEFAULT_WARN_FRACTION);
        assert_eq!(ledger.allocated, 0);
    }

    /// Over budget: the exempt checkpoint command is still allowed, with an
    /// instruction to stop afterwards, and is not metered.
    #[test]
    fn exempt_action_allowed_over_budget() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_workspace(temp.path());
        set_allocated(&paths, 81_000);

        let request = gate_request("git commit -m x", None, temp.path());
        let response = admit_action(
            temp.path(),
            &resolved(),
            &request,
            &RecordingCheckpoint::default(),
            &RecordingSpawner::default(),
        )
        .expect("admit");

        assert_eq!(response.permission, Permission::Allow);
        assert!(response.agent_message.unwrap().contains("then stop"));
        let ledger = load_ledger(&paths.ledger_path, 80_000, DEFAULT_WARN_FRACTION);
        assert_eq!(ledger.allocated, 81_000);
    }

    /// A terminal Complete record survives gate calls: even over budget the
    /// deny path must not run, so the record is never rewritten and no
    /// worker can be spawned for a finished task.
    #[test]
    fn completed_session_is_never_handed_off_by_the_gate() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_workspace(temp.path());
        crate::io::session::write_session(
            &paths.session_path,
            &crate::io::session::SessionRecord {
                iteration: 3,
                status: SessionStatus::Complete,
                started_at: None,
                previous_context: None,
            },
        )
        .expect("write");
        set_allocated(&paths, 81_000);

        let checkpoint = RecordingCheckpoint::default();
        let spawner = RecordingSpawner::default();
        let request = gate_request("rm -rf /tmp/x", None, temp.path());
        let response = admit_action(temp.path(), &resolved(), &request, &checkpoint, &spawner)
            .expect("admit");

        assert_eq!(response.permission, Permission::Allow);
        assert!(response.agent_message.unwrap().contains("complete"));
        assert_eq!(checkpoint.persisted.get(), 0);
        assert_eq!(spawner.spawned.get(), 0);

        let session = load_session(&paths.session_path);
        assert_eq!(session.status, SessionStatus::Complete);
        assert_eq!(session.iteration, 3);
        // Neither metered nor reset.
        let ledger = load_ledger(&paths.ledger_path, 80_000, DEFAULT_WARN_FRACTION);
        assert_eq!(ledger.allocated, 81_000);
    }

    #[test]
    fn exempt_action_under_budget_is_quietly_allowed() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_workspace(temp.path());

        let request = gate_request("git add -A", None, temp.path());
        let response = admit_action(
            temp.path(),
            &resolved(),
            &request,
            &RecordingCheckpoint::default(),
            &RecordingSpawner::default(),
        )
        .expect("admit");

        assert_eq!(response.permission, Permission::Allow);
        assert_eq!(response.agent_message, None);
    }
}
