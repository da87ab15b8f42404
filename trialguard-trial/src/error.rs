//! Error types for trial resolution.

use thiserror::Error;

/// Trial-resolution errors.
#[derive(Debug, Error)]
pub enum TrialError {
    /// A persisted timestamp could not be decoded.
    #[error("corrupted trial timestamp: {0}")]
    Decode(#[from] trialguard_types::Error),

    /// The settings store could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// The platform has no install record for the application.
    #[error("install record not found for {0}")]
    InstallRecordNotFound(String),

    /// Configuration values are out of range.
    #[error("invalid trial config: {0}")]
    InvalidConfig(String),

    /// Config file could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// IO error (config file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for trial operations.
pub type TrialResult<T> = Result<T, TrialError>;
