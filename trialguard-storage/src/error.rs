//! Error types for the storage adapters.

use thiserror::Error;
use trialguard_trial::TrialError;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not a JSON object of strings.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Namespace cannot be used as a file name.
    #[error("invalid namespace: {0:?}")]
    InvalidNamespace(String),

    /// No install path registered for the application.
    #[error("no install record for {0}")]
    NotFound(String),

    /// The platform has no per-user data directory.
    #[error("no local data directory on this platform")]
    NoDataDir,
}

impl From<StorageError> for TrialError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(app_id) => TrialError::InstallRecordNotFound(app_id),
            other => TrialError::Storage(other.to_string()),
        }
    }
}
