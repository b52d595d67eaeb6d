//! Error types for ym-core

use thiserror::Error;

/// Core error type for Yam
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Invalid configuration value
    #[error("[C002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C003: Malformed migration version identifier
    #[error("[C003] Invalid migration version '{version}': expected YYYYMMDDHHMMSS or 0")]
    InvalidVersion { version: String },

    /// C004: Unknown migration direction
    #[error("[C004] Invalid migration direction '{direction}': expected 'up' or 'down'")]
    InvalidDirection { direction: String },

    /// C005: IO error with file path context
    #[error("[C005] Failed to access '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C006: YAML parse or emit error
    #[error("[C006] YAML error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
