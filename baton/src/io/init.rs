//! Workspace scaffolding for `.baton/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::io::config::{BatonConfig, write_config};
use crate::io::ledger::{BudgetLedger, write_ledger};
use crate::io::session::{SessionRecord, write_session};

const TASK_TEMPLATE: &str = "\
---
test-command:
---

# Task

Describe the task here, then list acceptance criteria as checkboxes:

- [ ] replace this criterion
";

const GUARDRAILS_TEMPLATE: &str = "\
# Guardrails

Standing rules for every iteration, one bullet per rule:

- do not force-push
";

/// Well-known paths under a workspace root.
#[derive(Debug, Clone)]
pub struct BatonPaths {
    pub baton_dir: PathBuf,
    pub state_dir: PathBuf,
    pub config_path: PathBuf,
    pub ledger_path: PathBuf,
    pub session_path: PathBuf,
    pub task_path: PathBuf,
    pub guardrails_path: PathBuf,
}

impl BatonPaths {
    pub fn new(root: &Path) -> Self {
        let baton_dir = root.join(".baton");
        let state_dir = baton_dir.join("state");
        Self {
            config_path: state_dir.join("config.toml"),
            ledger_path: state_dir.join("ledger.json"),
            session_path: state_dir.join("session.json"),
            task_path: baton_dir.join("TASK.md"),
            guardrails_path: baton_dir.join("GUARDRAILS.md"),
            baton_dir,
            state_dir,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Overwrite existing files.
    pub force: bool,
}

/// Create `.baton/` scaffolding: documents, config, and initial state.
pub fn init_baton(root: &Path, options: &InitOptions) -> Result<BatonPaths> {
    let paths = BatonPaths::new(root);
    debug!(root = %root.display(), force = options.force, "initializing baton workspace");

    fs::create_dir_all(&paths.state_dir)
        .with_context(|| format!("create {}", paths.state_dir.display()))?;

    write_if_missing_or_force(&paths.task_path, TASK_TEMPLATE, options.force)?;
    write_if_missing_or_force(&paths.guardrails_path, GUARDRAILS_TEMPLATE, options.force)?;

    let config = BatonConfig::default();
    if options.force || !paths.config_path.exists() {
        write_config(&paths.config_path, &config)?;
    }
    if options.force || !paths.ledger_path.exists() {
        write_ledger(&paths.ledger_path, &BudgetLedger::empty(config.threshold))?;
    }
    if options.force || !paths.session_path.exists() {
        write_session(&paths.session_path, &SessionRecord::default())?;
    }

    Ok(paths)
}

fn write_if_missing_or_force(path: &Path, contents: &str, force: bool) -> Result<()> {
    if !force && path.exists() {
        return Ok(());
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
