//! Runs the task's verification command with a timeout and bounded output.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::core::verify::TestRun;

/// Parameters for one verification run.
#[derive(Debug, Clone)]
pub struct VerifyRequest {
    pub workdir: PathBuf,
    /// Shell command line from the task document's `test-command`.
    pub command: String,
    pub timeout: Duration,
    /// Truncate combined output beyond this many bytes.
    pub output_limit_bytes: usize,
}

/// Run the verification command and capture its result.
///
/// Timeout handling belongs to this runner, not the orchestrator: an expired
/// command is killed and reported as a failed run with `exit_code: None`.
/// There is no reattempt; a new stop event triggers a new run.
pub fn run_test_command(request: &VerifyRequest) -> Result<TestRun> {
    debug!(command = %request.command, timeout_secs = request.timeout.as_secs(), "running verification command");
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(&request.command)
        .current_dir(&request.workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .context("spawn verification command")?;

    let status = match child
        .wait_timeout(request.timeout)
        .context("wait for verification command")?
    {
        Some(status) => status,
        None => {
            warn!(timeout_secs = request.timeout.as_secs(), "verification command timed out");
            child.kill().context("kill verification command")?;
            child.wait().context("reap verification command")?;
            return Ok(TestRun {
                exit_code: None,
                output: format!(
                    "[verification command timed out after {}s]",
                    request.timeout.as_secs()
                ),
            });
        }
    };

    let output = child
        .wait_with_output()
        .context("collect verification output")?;
    let combined = combine_output(&output.stdout, &output.stderr, request.output_limit_bytes);
    Ok(TestRun {
        exit_code: status.code(),
        output: combined,
    })
}

fn combine_output(stdout: &[u8], stderr: &[u8], output_limit: usize) -> String {
    let mut buf = String::new();
    buf.push_str("=== stdout ===\n");
    buf.push_str(&String::from_utf8_lossy(stdout));
    buf.push_str("\n=== stderr ===\n");
    buf.push_str(&String::from_utf8_lossy(stderr));

    if buf.len() > output_limit {
        let mut cut = output_limit;
        while !buf.is_char_boundary(cut) {
            cut -= 1;
        }
        return format!("{}\n[truncated {} bytes]\n", &buf[..cut], buf.len() - cut);
    }
    buf
}
