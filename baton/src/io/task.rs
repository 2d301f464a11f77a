//! TaskSpec reader over `.baton/TASK.md`.
//!
//! The task document is externally authored: YAML frontmatter carries an
//! optional `test-command`, the body lists acceptance criteria as markdown
//! checkboxes. The core only ever reads it.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

/// One acceptance criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    pub text: String,
    pub checked: bool,
}

/// Parsed view of the task document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    pub test_command: Option<String>,
    /// Criteria in document order.
    pub criteria: Vec<Criterion>,
}

impl TaskSpec {
    pub fn unchecked_count(&self) -> usize {
        self.criteria.iter().filter(|c| !c.checked).count()
    }
}

/// Load the task document. Returns `None` if the file does not exist.
pub fn load_task(path: &Path) -> Result<Option<TaskSpec>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(Some(parse_task(&contents)))
}

fn parse_task(contents: &str) -> TaskSpec {
    let (frontmatter, body) = split_frontmatter(contents);
    TaskSpec {
        test_command: frontmatter.and_then(parse_test_command),
        criteria: parse_criteria(body),
    }
}

/// Split `---` fenced YAML frontmatter from the body, if present.
fn split_frontmatter(contents: &str) -> (Option<&str>, &str) {
    let Some(rest) = contents.strip_prefix("---\n") else {
        return (None, contents);
    };
    match rest.split_once("\n---") {
        Some((frontmatter, body)) => (Some(frontmatter), body),
        None => (None, contents),
    }
}

fn parse_test_command(frontmatter: &str) -> Option<String> {
    for line in frontmatter.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (key, value) = trimmed.split_once(':')?;
        if key.trim() != "test-command" {
            continue;
        }
        let mut v = value.trim().to_string();
        if ((v.starts_with('"') && v.ends_with('"')) || (v.starts_with('\'') && v.ends_with('\'')))
            && v.len() >= 2
        {
            v = v[1..v.len() - 1].to_string();
        }
        if v.is_empty() {
            return None;
        }
        return Some(v);
    }
    None
}

fn parse_criteria(body: &str) -> Vec<Criterion> {
    static CRITERION_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^\s*[-*]\s*\[( |x|X)\]\s*(.+?)\s*$").unwrap()
    });

    let mut criteria = Vec::new();
    for line in body.lines() {
        if let Some(caps) = CRITERION_RE.captures(line) {
            criteria.push(Criterion {
                checked: &caps[1] != " ",
                text: caps[2].to_string(),
            });
        }
    }
    criteria
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
---
test-command: cargo test
---

# Task

Ship the thing.

- [ ] parser handles empty input
- [x] CLI wired up
- [X] docs updated
not a criterion
* [ ] star bullets work too
";

    #[test]
    fn parses_test_command_and_ordered_criteria() {
        let task = parse_task(DOC);
        assert_eq!(task.test_command.as_deref(), Some("cargo test"));
        assert_eq!(task.criteria.len(), 4);
        assert_eq!(task.criteria[0].text, "parser handles empty input");
        assert!(!task.criteria[0].checked);
        assert!(task.criteria[1].checked);
        assert!(task.criteria[2].checked);
        assert_eq!(task.unchecked_count(), 2);
    }

    #[test]
    fn missing_frontmatter_means_no_test_command() {
        let task = parse_task("- [x] only criterion\n");
        assert_eq!(task.test_command, None);
        assert_eq!(task.unchecked_count(), 0);
        assert_eq!(task.criteria.len(), 1);
    }

    #[test]
    fn blank_test_command_counts_as_absent() {
        let task = parse_task("---\ntest-command:\n---\n- [ ] a\n");
        assert_eq!(task.test_command, None);
    }

    #[test]
    fn quoted_test_command_is_unwrapped() {
        let task = parse_task("---\ntest-command: \"sh -c 'exit 0'\"\n---\n");
        assert_eq!(task.test_command.as_deref(), Some("sh -c 'exit 0'"));
    }

    #[test]
    fn missing_file_is_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let task = load_task(&temp.path().join("TASK.md")).expect("load");
        assert_eq!(task, None);
    }
}
