use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::directory::ApiVersion;
use crate::engine::WaitPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub poll_interval_ms: u64,
    pub max_poll_interval_ms: u64,
    pub wait_timeout_secs: Option<u64>,
    pub api_version: ApiVersion,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: 250,
            max_poll_interval_ms: 4000,
            wait_timeout_secs: None,
            api_version: ApiVersion::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Defaults, then the file if given, then `STACKDOWN_*` environment
    /// variables. The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?.with_overrides(|key| std::env::var(key).ok())?,
            None => Self::from_env()?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("STACKDOWN_POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse_env("STACKDOWN_POLL_INTERVAL_MS", &value)?;
        }
        if let Some(value) = lookup("STACKDOWN_MAX_POLL_INTERVAL_MS") {
            self.max_poll_interval_ms = parse_env("STACKDOWN_MAX_POLL_INTERVAL_MS", &value)?;
        }
        if let Some(value) = lookup("STACKDOWN_WAIT_TIMEOUT_SECS") {
            self.wait_timeout_secs = if value.trim().is_empty() {
                None
            } else {
                Some(parse_env("STACKDOWN_WAIT_TIMEOUT_SECS", &value)?)
            };
        }
        if let Some(value) = lookup("STACKDOWN_API_VERSION") {
            self.api_version = value
                .parse()
                .with_context(|| "Invalid STACKDOWN_API_VERSION".to_string())?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than zero");
        }
        if self.max_poll_interval_ms < self.poll_interval_ms {
            bail!(
                "max_poll_interval_ms ({}) must not be below poll_interval_ms ({})",
                self.max_poll_interval_ms,
                self.poll_interval_ms
            );
        }
        if self.wait_timeout_secs == Some(0) {
            bail!("wait_timeout_secs must be greater than zero when set");
        }
        Ok(())
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_poll_interval: Duration::from_millis(self.max_poll_interval_ms),
            timeout: self.wait_timeout_secs.map(Duration::from_secs),
        }
    }
}

fn parse_env(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| anyhow!("Invalid {}={:?}: {}", key, value, e))
}
