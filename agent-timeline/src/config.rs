//! Configuration for the timeline runtime and CLI
//!
//! Values resolve in layers: built-in defaults, then the YAML config file,
//! then environment variables. CLI flags are applied last by the binary.

use std::path::{Path, PathBuf};

use agent_timeline_sdk::EVENT_PREFIX;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const ENV_LOG_LEVEL: &str = "AGENT_TIMELINE_LOG_LEVEL";
pub const ENV_CHANNEL_CAPACITY: &str = "AGENT_TIMELINE_CHANNEL_CAPACITY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Fallback filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Capacity of the state change broadcast channel
    pub change_channel_capacity: usize,
    /// Marker in front of event lines
    pub event_prefix: String,
    pub show_subagents: bool,
    /// Content lines shown for collapsed phases
    pub max_content_lines: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            change_channel_capacity: 1000,
            event_prefix: EVENT_PREFIX.to_string(),
            show_subagents: true,
            max_content_lines: 8,
        }
    }
}

impl TimelineConfig {
    /// Location of `config.yaml` in the platform config directory
    pub fn default_path() -> PathBuf {
        use directories::ProjectDirs;

        if let Some(proj_dirs) = ProjectDirs::from("com", "agent-timeline", "agent-timeline") {
            proj_dirs.config_dir().join("config.yaml")
        } else {
            PathBuf::from(".agent-timeline.yaml")
        }
    }

    /// Load from `path`, or from [`Self::default_path`] if it exists.
    ///
    /// An explicit path must exist; a missing default file means defaults.
    /// The result is not validated, since later layers may still fix it.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    debug!(path = %path.display(), "no config file, using defaults");
                    Self::default()
                }
            }
        };
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Failed to parse YAML config")
    }

    /// Override fields from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Override fields from `lookup`, which maps variable names to values
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(capacity) = lookup(ENV_CHANNEL_CAPACITY) {
            self.change_channel_capacity = capacity
                .trim()
                .parse()
                .with_context(|| format!("{} must be a positive integer", ENV_CHANNEL_CAPACITY))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.change_channel_capacity == 0 {
            bail!("change_channel_capacity must be greater than zero");
        }
        if self.event_prefix.is_empty() {
            bail!("event_prefix must not be empty");
        }
        Ok(())
    }
}
