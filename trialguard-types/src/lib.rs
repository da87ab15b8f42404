//! Core type definitions for TrialGuard.
//!
//! This crate defines the plugin-agnostic value types shared by the trial
//! resolver and its storage adapters:
//! - Millisecond timestamps with the `NOT_AVAILABLE` / `TRIAL_INVALID` sentinels
//! - The text codec used to persist a timestamp in a settings store
//!
//! Nothing here touches a clock or a store; see `trialguard-trial` for that.

mod codec;
mod timestamp;

pub use codec::{decode_timestamp, encode_timestamp};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid base64 encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("persisted value is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
