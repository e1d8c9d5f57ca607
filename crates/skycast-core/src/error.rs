//! Application-level error types for SkyCast.
//!
//! Domain errors (fetching, normalizing, archiving) live next to the code that
//! raises them in `skycast-weather`. This module covers what the binary and the
//! web layer need to report at startup: configuration and server errors.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a message suitable for an operator or end user.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Server error: {0}")]
    Server(String),
}

impl AppError {
    /// Returns a non-technical message describing the failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Server(_) => "The web server could not be started.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "Configuration file could not be read. Check its permissions.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}
