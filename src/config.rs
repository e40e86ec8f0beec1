//! Configuration file parser for ~/.config/xfeed/config.toml.
//!
//! Every key is optional and the file itself may be absent. Keys this crate
//! does not know are logged so typos surface without failing the run.
use serde::Deserialize;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::feed::USER_AGENT;
use crate::normalize::Options;

/// Mirror site used when none is configured.
pub const DEFAULT_SITE: &str = "https://xcancel.com";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mirror site base URL.
    pub site: String,

    /// Accounts loaded when `xfeed load` is given no handles.
    pub handles: Vec<String>,

    /// Keep reposts in normalized output.
    pub include_reposts: bool,

    pub user_agent: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: DEFAULT_SITE.to_string(),
            handles: Vec::new(),
            include_reposts: true,
            user_agent: USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 5] = [
        "site",
        "handles",
        "include_reposts",
        "user_agent",
        "timeout_secs",
    ];

    /// Reads the config at `path`, falling back to defaults when the file is
    /// absent or blank. Unknown keys are reported and ignored.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let Some(content) = Self::read_bounded(path)? else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        };
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Blank config file, using defaults");
            return Ok(Self::default());
        }

        Self::warn_unknown_keys(&content);
        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            site = %config.site,
            handles = config.handles.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Contents of `path`, or `None` if it does not exist. The size is taken
    /// from the open handle, so the checked file is the one read.
    fn read_bounded(path: &Path) -> Result<Option<String>, ConfigError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let size = file.metadata()?.len();
        if size > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "{} is {} bytes (max {} bytes)",
                path.display(),
                size,
                Self::MAX_FILE_SIZE
            )));
        }

        let mut content = String::new();
        file.take(Self::MAX_FILE_SIZE).read_to_string(&mut content)?;
        Ok(Some(content))
    }

    fn warn_unknown_keys(content: &str) {
        let Ok(table) = content.parse::<toml::Table>() else {
            return;
        };
        table
            .keys()
            .filter(|key| !Self::KNOWN_KEYS.contains(&key.as_str()))
            .for_each(|key| tracing::warn!(key = %key, "Unknown config key ignored"));
    }

    pub fn options(&self) -> Options {
        Options {
            include_reposts: self.include_reposts,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================
