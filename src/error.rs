//! Error types for qpanel.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for qpanel operations.
#[derive(Error, Debug)]
pub enum PanelError {
    /// User input rejected before any work was done (e.g. an empty query).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The query endpoint could not be reached or answered with an error.
    #[error("Network error: {0}")]
    Network(String),

    /// Nothing to export, or the download could not be written.
    #[error("Export error: {0}")]
    Export(String),

    /// Configuration errors (invalid config file, bad endpoint URL, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (terminal failures, unexpected states, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PanelError {
    /// Creates a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a network error with the given message.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Creates an export error with the given message.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation Error",
            Self::Network(_) => "Network Error",
            Self::Export(_) => "Export Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the bare message without the category prefix.
    pub fn detail(&self) -> &str {
        match self {
            Self::Validation(msg)
            | Self::Network(msg)
            | Self::Export(msg)
            | Self::Config(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

/// Result type alias using PanelError.
pub type Result<T> = std::result::Result<T, PanelError>;
