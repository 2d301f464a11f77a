//! Pure completion-verification decision table.
//!
//! Invoked at session stop: cross-checks outstanding task criteria against
//! the result of an external verification command.

/// Captured result of running the task's verification command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRun {
    /// Exit code of the command, `None` if it was killed (e.g. timeout).
    pub exit_code: Option<i32>,
    /// Combined stdout/stderr, already truncated to the configured limit.
    pub output: String,
}

impl TestRun {
    pub fn passed(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Outcome of completion verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Criteria remain unchecked; the session stays active.
    CriteriaRemaining { unchecked: usize, total: usize },
    /// All criteria checked, no verification command configured.
    CompleteUnverified,
    /// All criteria checked and the verification command passed.
    CompleteVerified,
    /// All criteria checked but verification failed: a contradiction the
    /// caller must see verbatim. The session stays active.
    TestContradiction { output: String },
}

impl VerifyOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            VerifyOutcome::CompleteUnverified | VerifyOutcome::CompleteVerified
        )
    }
}

/// Classify session completion from the criteria state and test result.
///
/// `test` must be `Some` only when a verification command was actually run,
/// which the caller does only once all criteria are checked.
pub fn classify_completion(unchecked: usize, total: usize, test: Option<&TestRun>) -> VerifyOutcome {
    if unchecked > 0 {
        return VerifyOutcome::CriteriaRemaining { unchecked, total };
    }
    match test {
        None => VerifyOutcome::CompleteUnverified,
        Some(run) if run.passed() => VerifyOutcome::CompleteVerified,
        Some(run) => VerifyOutcome::TestContradiction {
            output: run.output.clone(),
        },
    }
}
