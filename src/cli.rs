//! Command-line argument parsing for qpanel.

use crate::config::Config;
use crate::error::{PanelError, Result};
use crate::tui::headless::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// A terminal SQL query panel backed by a remote export endpoint.
#[derive(Parser, Debug)]
#[command(name = "qpanel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Database name sent with every query
    #[arg(short = 'd', long, value_name = "NAME")]
    pub database: Option<String>,

    /// Query endpoint URL
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory exported files are written to
    #[arg(long, value_name = "PATH")]
    pub download_dir: Option<PathBuf>,

    /// Accept invalid TLS certificates from the endpoint
    #[arg(long)]
    pub insecure: bool,

    // === Headless mode options ===
    /// Run without a terminal UI, executing scripted events
    #[arg(long)]
    pub headless: bool,

    /// Answer queries from an in-memory backend instead of the endpoint
    #[arg(long)]
    pub mock_backend: bool,

    /// Rows the mock backend returns, as a JSON array of objects
    #[arg(long, value_name = "JSON", requires = "mock_backend")]
    pub mock_response: Option<String>,

    /// Comma-separated events to execute in headless mode (e.g. "type:SELECT 1,key:f5")
    #[arg(long, value_name = "EVENTS")]
    pub events: Option<String>,

    /// Path to a script file with events (use "-" for stdin)
    #[arg(long, value_name = "PATH", conflicts_with = "events")]
    pub script: Option<String>,

    /// Screen size for headless mode (WIDTHxHEIGHT)
    #[arg(long, value_name = "SIZE", default_value = "80x24")]
    pub size: String,

    /// Output format for headless mode: text, json or frames
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Write headless output to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Stop at the first failed assertion
    #[arg(long)]
    pub fail_fast: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the --config path, or the platform default.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Applies command-line values over `config`. These take precedence
    /// over both the config file and the environment.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(endpoint) = &self.endpoint {
            config.backend.endpoint = Some(endpoint.clone());
        }
        if self.insecure {
            config.backend.accept_invalid_certs = true;
        }
        if let Some(database) = &self.database {
            config.panel.database = Some(database.clone());
        }
        if let Some(dir) = &self.download_dir {
            config.panel.download_dir = Some(dir.clone());
        }
    }

    pub fn is_headless(&self) -> bool {
        self.headless
    }

    /// Parses --size as (width, height).
    pub fn parse_screen_size(&self) -> Result<(u16, u16)> {
        let (width, height) = crate::tui::headless::parse_size(&self.size)?;
        if width == 0 || height == 0 {
            return Err(PanelError::config(format!(
                "Invalid size '{}': width and height must be positive",
                self.size
            )));
        }
        Ok((width, height))
    }

    pub fn parse_output_format(&self) -> Result<OutputFormat> {
        self.output.parse()
    }

    /// Checks the headless options. Does nothing outside headless mode.
    pub fn validate_headless(&self) -> Result<()> {
        if !self.headless {
            return Ok(());
        }
        if self.events.is_none() && self.script.is_none() {
            return Err(PanelError::config("--headless requires --events or --script"));
        }
        self.parse_screen_size()?;
        self.parse_output_format()?;
        Ok(())
    }
}
