//! Budget-gated admission control and session handoff for agent loops.
//!
//! Baton meters an autonomous agent's resource consumption against a fixed
//! cumulative budget, gates every action through an admission decision, and
//! hands execution to a fresh worker once the budget is exhausted. Each call
//! is a separate process invocation; all state lives in files under
//! `.baton/`. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (gate evaluation, action
//!   classification, cost estimation, completion verification). No I/O,
//!   fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (persisted ledger and session
//!   record, configuration, external capabilities, wire protocol). Isolated
//!   to enable mocking in tests.
//!
//! Orchestration modules ([`admit`], [`cycle`], [`stop`], [`handoff`])
//! coordinate core logic with I/O to implement the CLI commands.

pub mod admit;
pub mod core;
pub mod cycle;
pub mod errors;
pub mod exit_codes;
pub mod handoff;
pub mod io;
pub mod logging;
pub mod stop;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
