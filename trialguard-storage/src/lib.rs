//! File-backed adapters for TrialGuard.
//!
//! Provides the two persistent ports a desktop host needs:
//! - [`JsonSettingsStore`]: one JSON file per settings namespace
//! - [`FileInstallRecord`]: first-install time taken from file metadata
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   simple_trial.json    {"last_check": "MTcwMDAwMDAwMDAwMA=="}
//! ```
//!
//! Writes go to a per-process sibling temp file that is fsynced, renamed over
//! the original, and followed by an fsync of the directory, so a crash
//! mid-write leaves either the previous or the new contents.

mod error;
mod install_record;
mod settings;

pub use error::{StorageError, StorageResult};
pub use install_record::FileInstallRecord;
pub use settings::JsonSettingsStore;
