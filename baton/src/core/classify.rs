//! Typed classification of gated actions.
//!
//! Each request carries either a command line or a file path. Classification
//! happens once, up front, into an [`ActionKind`]; everything downstream
//! (exemption, metering) branches on the kind instead of re-matching strings.

use crate::core::types::ActionKind;

/// Git subcommands that persist work and must stay allow-able over budget.
const PERSIST_GIT_SUBCOMMANDS: &[&str] = &["add", "commit", "push", "stash", "tag"];

const INSPECT_PROGRAMS: &[&str] = &[
    "cat", "head", "tail", "less", "ls", "find", "grep", "rg", "wc", "stat", "file", "tree",
    "pwd", "which", "du", "env",
];

const MUTATE_PROGRAMS: &[&str] = &[
    "rm", "mv", "cp", "mkdir", "rmdir", "touch", "chmod", "chown", "ln", "sed", "tee",
    "truncate", "patch",
];

/// Classify a command line or file path into an [`ActionKind`].
pub fn classify(descriptor: &str) -> ActionKind {
    let mut words = descriptor.split_whitespace();
    let Some(program) = words.next() else {
        return ActionKind::Other;
    };

    if program == "git" {
        return match words.next() {
            Some(sub) if PERSIST_GIT_SUBCOMMANDS.contains(&sub) => ActionKind::Persist,
            Some("status" | "diff" | "log" | "show" | "blame") => ActionKind::Inspect,
            _ => ActionKind::Other,
        };
    }
    if INSPECT_PROGRAMS.contains(&program) {
        return ActionKind::Inspect;
    }
    if MUTATE_PROGRAMS.contains(&program) {
        return ActionKind::Mutate;
    }
    // A bare path (no arguments) is a file read from the content-gating hook.
    if words.next().is_none() && looks_like_path(program) {
        return ActionKind::Inspect;
    }
    ActionKind::Other
}

fn looks_like_path(token: &str) -> bool {
    token.contains('/') || token.contains('.')
}
