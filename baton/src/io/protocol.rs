//! JSON wire contract: single object in on stdin, single object out on
//! stdout. Diagnostics never touch stdout.

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Request for a content-gating call.
#[derive(Debug, Clone, Deserialize)]
pub struct GateRequest {
    /// Command line or file path describing the proposed action.
    pub command_or_path: String,
    /// Raw content, or a numeric size, for cost estimation.
    #[serde(default)]
    pub content_or_size_hint: Option<String>,
    pub workspace_root: PathBuf,
    #[serde(default)]
    pub event_status: Option<String>,
}

/// Request for a cycle-start or session-stop call. All fields optional so the
/// commands also work from a bare invocation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EventRequest {
    pub workspace_root: Option<PathBuf>,
    pub event_status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Allow,
    Deny,
}

/// Response to a content-gating call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResponse {
    pub permission: Permission,
    /// Human-facing note (warnings, deny reasons).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    /// Instruction fed back to the agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_message: Option<String>,
}

/// Response to a cycle-start or session-stop call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowResponse {
    #[serde(rename = "continue")]
    pub continue_: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followup_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_message: Option<String>,
}

/// Read one JSON request object from the reader.
pub fn read_request<T: DeserializeOwned>(mut reader: impl Read) -> Result<T> {
    let mut buf = String::new();
    reader
        .read_to_string(&mut buf)
        .context("read request from stdin")?;
    serde_json::from_str(&buf).context("parse request json")
}

/// Read a request that may legitimately be absent (blank stdin).
pub fn read_optional_request<T: DeserializeOwned + Default>(mut reader: impl Read) -> Result<T> {
    let mut buf = String::new();
    reader
        .read_to_string(&mut buf)
        .context("read request from stdin")?;
    if buf.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(&buf).context("parse request json")
}

/// Write one JSON response object, newline-terminated, and flush.
pub fn write_response<T: Serialize>(mut writer: impl Write, response: &T) -> Result<()> {
    let buf = serde_json::to_string(response).context("serialize response json")?;
    writeln!(writer, "{buf}").context("write response")?;
    writer.flush().context("flush response")?;
    Ok(())
}
