//! Settings store keeping each namespace in its own JSON file.

use crate::error::{StorageError, StorageResult};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;
use trialguard_trial::{SettingsStore, TrialError, TrialResult};

type Namespace = BTreeMap<String, String>;

/// Settings persisted under a root directory as `<namespace>.json`.
///
/// Writes within one process are serialized; each write replaces the whole
/// file atomically and durably. Concurrent writers in separate processes do
/// not corrupt the file but may lose each other's updates.
#[derive(Debug)]
pub struct JsonSettingsStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonSettingsStore {
    /// Opens (or creates) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Opens the store under the platform's local data directory, in a
    /// subdirectory named after `app_name`.
    pub fn open_default(app_name: &str) -> StorageResult<Self> {
        validate_name(app_name)?;
        let base = dirs::data_local_dir().ok_or(StorageError::NoDataDir)?;
        Self::open(base.join(app_name))
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads one value.
    pub fn get_value(&self, namespace: &str, key: &str) -> StorageResult<Option<String>> {
        let path = self.namespace_path(namespace)?;
        Ok(load(&path)?.remove(key))
    }

    /// Writes one value, replacing the namespace file atomically.
    pub fn put_value(&self, namespace: &str, key: &str, value: &str) -> StorageResult<()> {
        let path = self.namespace_path(namespace)?;
        let _guard = self.write_lock.lock().map_err(|_| {
            StorageError::Io(std::io::Error::other("settings write lock poisoned"))
        })?;

        let mut entries = load(&path)?;
        entries.insert(key.to_string(), value.to_string());

        write_file_atomic_durable(&path, &serde_json::to_vec_pretty(&entries)?)?;
        debug!(namespace, key, path = %path.display(), "settings written");
        Ok(())
    }

    /// Deletes a whole namespace, as a user clearing app data would.
    pub fn remove_namespace(&self, namespace: &str) -> StorageResult<()> {
        let path = self.namespace_path(namespace)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn namespace_path(&self, namespace: &str) -> StorageResult<PathBuf> {
        validate_name(namespace)?;
        Ok(self.root.join(format!("{namespace}.json")))
    }
}

impl SettingsStore for JsonSettingsStore {
    fn get(&self, namespace: &str, key: &str) -> TrialResult<Option<String>> {
        self.get_value(namespace, key).map_err(TrialError::from)
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> TrialResult<()> {
        self.put_value(namespace, key, value)
            .map_err(TrialError::from)
    }
}

/// Names become file names: no separators, no dot-prefixed names.
fn validate_name(name: &str) -> StorageResult<()> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', '\0'])
        || name.contains("..");
    if bad {
        return Err(StorageError::InvalidNamespace(name.to_string()));
    }
    Ok(())
}

/// Temp file, fsync, rename, then fsync the directory so the rename itself
/// survives a crash. The temp name is per process.
fn write_file_atomic_durable(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::other("settings path has no parent"))?;
    let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));

    let mut f = File::create(&tmp)?;
    f.write_all(bytes)?;
    f.sync_all()?;
    drop(f);

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    sync_directory(parent)
}

#[cfg(unix)]
fn sync_directory(path: &Path) -> StorageResult<()> {
    File::open(path)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_directory(_path: &Path) -> StorageResult<()> {
    Ok(())
}

fn load(path: &Path) -> StorageResult<Namespace> {
    match fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Namespace::new()),
        Err(e) => Err(e.into()),
    }
}
