//! Configuration management for the PRISM client.

use crate::{ConfigError, ConfigResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default PRISM API base URL (can be overridden at compile time via PRISM_API_URL env var).
pub const DEFAULT_API_URL: &str = match option_env!("PRISM_API_URL") {
    Some(url) => url,
    None => "http://localhost:8000",
};

pub const DEFAULT_LOG_LEVEL: &str = "info";

const API_URL_ENV: &str = "PRISM_API_URL";
const LOG_LEVEL_ENV: &str = "PRISM_LOG_LEVEL";

/// Client configuration stored in `~/.prism/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// `trace` through `error`; see [`crate::parse_level`].
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Base URL of the PRISM REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout applied by the HTTP client. None means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api_url: default_api_url(),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// `config.json` if present, else defaults; the environment wins over both.
    pub fn load(paths: &Paths) -> ConfigResult<Self> {
        let file = paths.config_file();
        let base = match file.try_exists()? {
            true => Self::load_from_file(&file)?,
            false => Self::default(),
        };
        Ok(base.with_env())
    }

    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        Ok(serde_json::from_slice(&std::fs::read(path)?)?)
    }

    /// Write `config.json`, creating `~/.prism` first.
    pub fn save(&self, paths: &Paths) -> ConfigResult<()> {
        paths.ensure_dirs()?;
        std::fs::write(paths.config_file(), serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    fn with_env(mut self) -> Self {
        self.apply_overrides(|name| std::env::var(name).ok());
        self
    }

    /// Apply `PRISM_API_URL` / `PRISM_LOG_LEVEL` style overrides from a lookup.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(api_url) = non_empty(API_URL_ENV) {
            self.api_url = api_url;
        }
        if let Some(log_level) = non_empty(LOG_LEVEL_ENV) {
            self.log_level = log_level;
        }
    }

    /// Get the API base URL as a parsed URL.
    ///
    /// Only `http` and `https` are accepted.
    pub fn api_url(&self) -> ConfigResult<Url> {
        let url = Url::parse(&self.api_url)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::Invalid(format!(
                "unsupported API URL scheme '{}'",
                other
            ))),
        }
    }

    /// Request timeout as a Duration, if configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
