//! Configuration management for qpanel.
//!
//! Handles loading configuration from TOML files and environment variables.
//! Precedence, highest first: CLI arguments, config file, environment, defaults.

use crate::error::{PanelError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Endpoint used when neither the config file nor the environment names one.
pub const DEFAULT_ENDPOINT: &str = "https://localhost:7010/api/exportQuery";

/// Environment variable overriding the default endpoint.
pub const ENDPOINT_ENV: &str = "QPANEL_ENDPOINT";

/// Environment variable providing the default database selection.
pub const DATABASE_ENV: &str = "QPANEL_DATABASE";

const DEFAULT_TOAST_DURATION_MS: u64 = 3000;

/// Main configuration structure for qpanel.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Query endpoint settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Panel behaviour settings.
    #[serde(default)]
    pub panel: PanelConfig,
}

/// Settings for the remote query endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct BackendConfig {
    /// Full URL the query is POSTed to.
    pub endpoint: Option<String>,

    /// Accept self-signed certificates (local HTTPS development servers).
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Request timeout. Unset means the request waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl BackendConfig {
    /// Returns the configured endpoint, or the built-in default.
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    /// Returns the request timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Settings for the panel itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PanelConfig {
    /// Database name sent with every query.
    pub database: Option<String>,

    /// Directory exported files are written to.
    pub download_dir: Option<PathBuf>,

    /// How long a toast stays on screen.
    #[serde(default = "default_toast_duration_ms")]
    pub toast_duration_ms: u64,
}

fn default_toast_duration_ms() -> u64 {
    DEFAULT_TOAST_DURATION_MS
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            database: None,
            download_dir: None,
            toast_duration_ms: default_toast_duration_ms(),
        }
    }
}

impl PanelConfig {
    /// Returns the download directory: configured, else the platform
    /// download directory, else the current directory.
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Returns the toast display duration.
    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("qpanel")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| PanelError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            PanelError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Fills unset values from the process environment.
    pub fn apply_env_defaults(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Fills unset values using the given variable lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.backend.endpoint.is_none() {
            self.backend.endpoint = lookup(ENDPOINT_ENV);
        }
        if self.panel.database.is_none() {
            self.panel.database = lookup(DATABASE_ENV);
        }
    }

    /// Checks that the endpoint is an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.backend.endpoint();
        let url = Url::parse(endpoint)
            .map_err(|e| PanelError::config(format!("Invalid endpoint '{endpoint}': {e}")))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(PanelError::config(format!(
                "Invalid endpoint scheme '{}'. Expected 'http' or 'https'",
                url.scheme()
            )));
        }

        Ok(())
    }
}
