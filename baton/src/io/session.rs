//! Persisted session record (`.baton/state/session.json`).
//!
//! The record is the sole source of truth for iteration bookkeeping between
//! process invocations. Writes are rename-swapped; a corrupt record recovers
//! by defaulting the iteration to 0 instead of failing the caller.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::types::SessionStatus;

/// Persisted bookkeeping for the current session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRecord {
    /// Iteration number, strictly increasing across work cycles.
    pub iteration: u32,
    pub status: SessionStatus,
    /// When the current iteration was activated.
    pub started_at: Option<DateTime<Utc>>,
    /// Budget units allocated at the most recent handoff, if any.
    pub previous_context: Option<u64>,
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self {
            iteration: 0,
            status: SessionStatus::Initialized,
            started_at: None,
            previous_context: None,
        }
    }
}

/// Load the session record, defaulting on a missing or corrupt file.
pub fn load_session(path: &Path) -> SessionRecord {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            debug!(path = %path.display(), %err, "no readable session record, using default");
            return SessionRecord::default();
        }
    };
    match serde_json::from_str(&contents) {
        Ok(record) => record,
        Err(err) => {
            warn!(path = %path.display(), %err, "corrupt session record, defaulting iteration to 0");
            SessionRecord::default()
        }
    }
}

/// Advance to the next work cycle: increment the iteration, mark it active,
/// stamp the current time, persist, and return the new record.
///
/// Callers must have passed the admission gate first; a denied cycle never
/// reaches this. Fails on a completed session, which is terminal.
pub fn advance(path: &Path) -> Result<SessionRecord> {
    let prev = load_session(path);
    if prev.status == SessionStatus::Complete {
        bail!("session is complete; a new task requires a new task document");
    }
    let record = SessionRecord {
        iteration: prev.iteration + 1,
        status: SessionStatus::Active,
        started_at: Some(Utc::now()),
        previous_context: prev.previous_context,
    };
    write_session(path, &record)?;
    debug!(iteration = record.iteration, "advanced session record");
    Ok(record)
}

/// Atomically write the session record to disk (temp file + rename).
pub fn write_session(path: &Path, record: &SessionRecord) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(record)?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("session path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp session record {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("replace session record {}", path.display()))?;
    Ok(())
}
