//! Read-only view of `.baton/GUARDRAILS.md`.
//!
//! Guardrails are owned externally and append-only; baton only surfaces them
//! to each fresh work cycle so standing rules survive handoffs.

use std::fs;
use std::path::Path;

/// Load guardrail rules: one per bullet line. Missing file means no rules.
pub fn load_guardrails(path: &Path) -> Vec<String> {
    let Ok(contents) = fs::read_to_string(path) else {
        return Vec::new();
    };
    contents
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
                .map(|rule| rule.trim().to_string())
        })
        .filter(|rule| !rule.is_empty())
        .collect()
}
