//! Application error types.

use thiserror::Error;

/// Application-level errors for Labyrinth.
///
/// These cover configuration and data ingestion. The gate and resolver
/// queries themselves never fail: unknown ids and malformed nodes take safe
/// defaults instead of raising.
#[derive(Error, Debug)]
pub enum AppError {
    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Data ingestion errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Malformed data in {file}: {message}")]
    DataFormat { file: String, message: String },

    // Domain errors
    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),
}
