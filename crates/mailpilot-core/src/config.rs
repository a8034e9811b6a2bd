//! Configuration.
//!
//! Stored as JSON, by default at `<config dir>/mailpilot/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mailpilot_query::DateFormat;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Account whose folder tree is used, usually its email address.
    pub account: String,
    /// Layout of dates inside received-time restrictions.
    pub date_format: DateFormat,
    /// Attachment verification when sending.
    pub send: RetryPolicy,
    /// Attachment download behaviour.
    pub download: DownloadOptions,
}

impl Config {
    /// Creates a configuration for `account` with default settings.
    #[must_use]
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            ..Self::default()
        }
    }

    /// Returns the default configuration file path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mailpilot")
            .join("config.json")
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Loads the configuration from [`Config::default_path`], falling back to
    /// defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_or_default() -> Result<Self> {
        let path = Self::default_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Saves the configuration, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        tracing::info!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Checks values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the account is empty or the retry policy
    /// allows no attempts.
    pub fn validate(&self) -> Result<()> {
        if self.account.trim().is_empty() {
            return Err(Error::Config("account is required".to_string()));
        }
        if self.send.max_attempts == 0 {
            return Err(Error::Config(
                "send.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Bounded retry for attachment verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_attempts: u32,
    /// Wait between attempts, in seconds.
    pub retry_delay_secs: u64,
}

impl RetryPolicy {
    /// Default number of attempts.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
    /// Default wait between attempts.
    pub const DEFAULT_RETRY_DELAY_SECS: u64 = 30;

    /// Creates a policy.
    #[must_use]
    pub const fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts,
            retry_delay_secs: retry_delay.as_secs(),
        }
    }

    /// Returns the wait between attempts.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            retry_delay_secs: Self::DEFAULT_RETRY_DELAY_SECS,
        }
    }
}

/// Options for saving attachments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadOptions {
    /// Attachments whose file name contains any of these are skipped.
    pub exclude: Vec<String>,
    /// Save under a fresh unique name instead of the original one.
    pub rename: bool,
}

impl DownloadOptions {
    /// Creates options that keep every attachment under its own name.
    #[must_use]
    pub const fn keep_all() -> Self {
        Self {
            exclude: Vec::new(),
            rename: false,
        }
    }

    /// Adds an exclusion substring.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Sets whether attachments get unique names.
    #[must_use]
    pub const fn rename(mut self, rename: bool) -> Self {
        self.rename = rename;
        self
    }

    /// Returns `true` if an attachment called `file_name` should be saved.
    #[must_use]
    pub fn keeps(&self, file_name: &str) -> bool {
        !self
            .exclude
            .iter()
            .any(|pattern| file_name.contains(pattern.as_str()))
    }
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            exclude: vec![".jpg".to_string()],
            rename: false,
        }
    }
}
