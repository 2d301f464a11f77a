//! Stable exit codes for baton CLI commands.
//!
//! Gate and lifecycle calls report their decisions in the response JSON and
//! exit `OK` whenever a well-formed response was produced; the codes below
//! exist for `baton status` so shell loops can branch on session state.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid input, state, or configuration.
pub const INVALID: i32 = 1;
/// `baton status` found a completed session.
pub const COMPLETE: i32 = 2;
/// `baton status` found a pending handoff awaiting resume.
pub const HANDOFF: i32 = 3;
