//! Install record derived from the metadata of an installed file.
//!
//! Desktop platforms keep no first-install registry, so the creation time of
//! a file the installer lays down stands in for it. Filesystems without birth
//! times fall back to the modification time, which an update may move
//! forward.

use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use trialguard_trial::{InstallRecord, TrialError, TrialResult};
use trialguard_types::Timestamp;

/// Maps application ids to the file whose age marks their installation.
#[derive(Debug, Clone, Default)]
pub struct FileInstallRecord {
    paths: HashMap<String, PathBuf>,
}

impl FileInstallRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `path` as the install marker of `app_id`.
    #[must_use]
    pub fn with(mut self, app_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(app_id.into(), path.into());
        self
    }

    /// Install time of `app_id`.
    ///
    /// # Errors
    ///
    /// [`StorageError::NotFound`] if no path is registered or the file is gone.
    pub fn install_time(&self, app_id: &str) -> StorageResult<Timestamp> {
        let path = self
            .paths
            .get(app_id)
            .ok_or_else(|| StorageError::NotFound(app_id.to_string()))?;
        match file_birth_time(path) {
            Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(app_id.to_string()))
            }
            other => other,
        }
    }
}

impl InstallRecord for FileInstallRecord {
    fn first_install_time(&self, app_id: &str) -> TrialResult<Timestamp> {
        self.install_time(app_id).map_err(TrialError::from)
    }
}

fn file_birth_time(path: &Path) -> StorageResult<Timestamp> {
    let meta = std::fs::metadata(path)?;
    let time = match meta.created() {
        Ok(created) => created,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no birth time, using mtime");
            meta.modified()?
        }
    };
    Ok(Timestamp::from_datetime(DateTime::<Utc>::from(time)))
}
