//! Error types for Axis Life Score
//!
//! The scoring path itself never fails; these errors come from the surfaces
//! around it: configuration loading, log entry validation, and history stores.

use thiserror::Error;

/// Errors that can occur outside the pure scoring functions
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid daily log: {0}")]
    InvalidLog(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid TOML configuration: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    #[error("Not enough data yet: {0}")]
    NotEnoughData(String),
}
