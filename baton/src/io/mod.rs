//! Side-effecting operations: persisted state, configuration, documents,
//! external capabilities, and the JSON wire protocol. Isolated from `core`
//! to enable mocking in tests.

pub mod checkpoint;
pub mod config;
pub mod git;
pub mod guardrails;
pub mod init;
pub mod ledger;
pub mod protocol;
pub mod session;
pub mod spawner;
pub mod task;
pub mod verifier;
