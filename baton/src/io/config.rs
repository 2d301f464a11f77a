//! Baton configuration stored under `.baton/state/config.toml`, plus
//! one-shot resolution of the auto-continuation mode.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Environment variable carrying the remote-continuation credential.
/// Takes precedence over any config file.
pub const REMOTE_TOKEN_ENV: &str = "BATON_REMOTE_TOKEN";

/// Baton configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatonConfig {
    /// Total budget units available to one session before handoff.
    pub threshold: u64,

    /// Fraction of the threshold at which admission warnings begin.
    pub warn_fraction: f64,

    /// Divisor approximating characters per token in metered content.
    pub chars_per_token: u64,

    /// Multiplier approximating the ratio of metered content to total
    /// session context.
    pub context_multiplier: u64,

    pub verify: VerifyConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VerifyConfig {
    /// Wall-clock budget for the task's verification command, in seconds.
    pub timeout_secs: u64,
    /// Truncate verification output beyond this many bytes.
    pub output_limit_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RemoteConfig {
    /// Credential enabling auto-continuation. Empty means local mode.
    pub token: Option<String>,
    /// Command used to spawn a fresh worker (e.g. `["codex","exec"]`).
    pub worker_command: Vec<String>,
}

impl Default for BatonConfig {
    fn default() -> Self {
        Self {
            threshold: 80_000,
            warn_fraction: 0.8,
            chars_per_token: 4,
            context_multiplier: 4,
            verify: VerifyConfig::default(),
            remote: RemoteConfig::default(),
        }
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10 * 60,
            output_limit_bytes: 100_000,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            token: None,
            worker_command: vec!["codex".to_string(), "exec".to_string()],
        }
    }
}

impl BatonConfig {
    pub fn validate(&self) -> Result<()> {
        if self.threshold == 0 {
            return Err(anyhow!("threshold must be > 0"));
        }
        if !(self.warn_fraction > 0.0 && self.warn_fraction < 1.0) {
            return Err(anyhow!("warn_fraction must be between 0 and 1 exclusive"));
        }
        if self.chars_per_token == 0 {
            return Err(anyhow!("chars_per_token must be > 0"));
        }
        if self.context_multiplier == 0 {
            return Err(anyhow!("context_multiplier must be > 0"));
        }
        if self.verify.timeout_secs == 0 {
            return Err(anyhow!("verify.timeout_secs must be > 0"));
        }
        if self.verify.output_limit_bytes == 0 {
            return Err(anyhow!("verify.output_limit_bytes must be > 0"));
        }
        if self.remote.worker_command.is_empty()
            || self.remote.worker_command[0].trim().is_empty()
        {
            return Err(anyhow!("remote.worker_command must be a non-empty array"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `BatonConfig::default()`.
pub fn load_config(path: &Path) -> Result<BatonConfig> {
    if !path.exists() {
        let cfg = BatonConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BatonConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &BatonConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

/// Continuation mode after a handoff, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// A fresh worker is spawned automatically with this credential.
    Remote { token: String },
    /// A human must resume manually.
    Local,
}

/// Fully-resolved runtime configuration, passed by value to orchestration.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: BatonConfig,
    pub continuation: Continuation,
}

/// Resolve the continuation mode in fixed precedence: explicit environment
/// value, then project-local config, then user-global config. First
/// non-blank match wins; blank credentials count as unset.
pub fn resolve_continuation(
    env_token: Option<&str>,
    project: &BatonConfig,
    user_global: Option<&BatonConfig>,
) -> Continuation {
    let candidates = [
        env_token.map(str::to_string),
        project.remote.token.clone(),
        user_global.and_then(|cfg| cfg.remote.token.clone()),
    ];
    for candidate in candidates.into_iter().flatten() {
        let token = candidate.trim();
        if !token.is_empty() {
            return Continuation::Remote {
                token: token.to_string(),
            };
        }
    }
    Continuation::Local
}

/// Path of the user-global config file (`~/.config/baton/config.toml`).
pub fn user_global_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".config").join("baton").join("config.toml"))
}

/// Load project config and resolve continuation against the real environment.
pub fn resolve(config_path: &Path) -> Result<ResolvedConfig> {
    let config = load_config(config_path)?;
    let env_token = std::env::var(REMOTE_TOKEN_ENV).ok();
    let user_global = user_global_config_path()
        .filter(|path| path.is_file())
        .and_then(|path| load_config(&path).ok());
    let continuation = resolve_continuation(env_token.as_deref(), &config, user_global.as_ref());
    debug!(remote = matches!(continuation, Continuation::Remote { .. }), "resolved continuation mode");
    Ok(ResolvedConfig {
        config,
        continuation,
    })
}
