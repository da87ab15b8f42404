//! Ports to the outside world, bundled into a [`TrialEnv`].
//!
//! Factors never reach for process-wide state. Everything they read or write
//! goes through one of these handles:
//! - [`SettingsStore`]: string key-value store that survives restarts
//! - [`InstallRecord`]: immutable "first installed at" record kept by the platform
//! - [`BackupTrigger`]: fire-and-forget request to back up the settings store
//! - [`Clock`]: wall clock in milliseconds
//!
//! In-process implementations of each live here so hosts and tests can wire
//! a resolver without any platform adapter.

use crate::error::{TrialError, TrialResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use trialguard_types::Timestamp;

/// Persistent string settings, grouped into namespaces (one settings file each).
///
/// Each `get`/`put` must be atomic for a single key. A successful `put` is
/// committed before it returns.
pub trait SettingsStore: Send + Sync {
    /// Returns the value under `key`, or `None` if it was never written or was cleared.
    fn get(&self, namespace: &str, key: &str) -> TrialResult<Option<String>>;

    /// Writes and commits `value` under `key`.
    fn put(&self, namespace: &str, key: &str, value: &str) -> TrialResult<()>;
}

/// The platform's record of when an application was first installed.
pub trait InstallRecord: Send + Sync {
    /// Returns the first-install time of `app_id`.
    ///
    /// # Errors
    ///
    /// [`TrialError::InstallRecordNotFound`] if the platform has no record.
    fn first_install_time(&self, app_id: &str) -> TrialResult<Timestamp>;
}

/// Requests that the settings store be replicated somewhere that survives a
/// reinstall. Success or failure is never observed.
pub trait BackupTrigger: Send + Sync {
    fn notify_data_changed(&self);
}

impl<F> BackupTrigger for F
where
    F: Fn() + Send + Sync,
{
    fn notify_data_changed(&self) {
        self()
    }
}

/// Source of "now".
pub trait Clock: Send + Sync {
    /// Current wall-clock time in milliseconds since the Unix epoch.
    fn now(&self) -> Timestamp;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_datetime(chrono::Utc::now())
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: Timestamp) -> Self {
        Self {
            millis: AtomicI64::new(start.millis()),
        }
    }

    /// Creates a clock frozen at the current system time.
    #[must_use]
    pub fn starting_now() -> Self {
        Self::new(SystemClock.now())
    }

    /// Jumps to `ts`, forwards or backwards.
    pub fn set(&self, ts: Timestamp) {
        self.millis.store(ts.millis(), Ordering::SeqCst);
    }

    /// Moves the clock by `millis` (negative values roll it back).
    pub fn advance(&self, millis: i64) {
        let _ = self
            .millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |m| {
                Some(m.saturating_add(millis))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Settings kept in process memory. Lost on drop.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemorySettingsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes one key, as if the user cleared it.
    pub fn remove(&self, namespace: &str, key: &str) -> TrialResult<Option<String>> {
        let mut entries = self.lock()?;
        Ok(entries.remove(&(namespace.to_string(), key.to_string())))
    }

    /// Removes every key in `namespace`, as if the settings file was deleted.
    pub fn clear_namespace(&self, namespace: &str) -> TrialResult<()> {
        let mut entries = self.lock()?;
        entries.retain(|(ns, _), _| ns != namespace);
        Ok(())
    }

    fn lock(&self) -> TrialResult<std::sync::MutexGuard<'_, HashMap<(String, String), String>>> {
        self.entries
            .lock()
            .map_err(|_| TrialError::Storage("settings lock poisoned".to_string()))
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, namespace: &str, key: &str) -> TrialResult<Option<String>> {
        let entries = self.lock()?;
        Ok(entries
            .get(&(namespace.to_string(), key.to_string()))
            .cloned())
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> TrialResult<()> {
        let mut entries = self.lock()?;
        entries.insert((namespace.to_string(), key.to_string()), value.to_string());
        Ok(())
    }
}

/// An install record with a fixed set of known applications.
#[derive(Debug, Clone, Default)]
pub struct StaticInstallRecord {
    records: HashMap<String, Timestamp>,
}

impl StaticInstallRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `installed_at` as the first-install time of `app_id`.
    #[must_use]
    pub fn with(mut self, app_id: impl Into<String>, installed_at: Timestamp) -> Self {
        self.records.insert(app_id.into(), installed_at);
        self
    }
}

impl InstallRecord for StaticInstallRecord {
    fn first_install_time(&self, app_id: &str) -> TrialResult<Timestamp> {
        self.records
            .get(app_id)
            .copied()
            .ok_or_else(|| TrialError::InstallRecordNotFound(app_id.to_string()))
    }
}

/// Backup trigger that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBackup;

impl BackupTrigger for NoopBackup {
    fn notify_data_changed(&self) {}
}

/// Backup trigger that only counts how often it fired.
#[derive(Debug, Default)]
pub struct CountingBackup {
    count: AtomicUsize,
}

impl CountingBackup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of backup requests seen so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl BackupTrigger for CountingBackup {
    fn notify_data_changed(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Handles to every external capability a factor may use.
///
/// Cloning is cheap; all handles are shared.
#[derive(Clone)]
pub struct TrialEnv {
    settings: Arc<dyn SettingsStore>,
    install_record: Arc<dyn InstallRecord>,
    backup: Arc<dyn BackupTrigger>,
    clock: Arc<dyn Clock>,
}

impl TrialEnv {
    /// Creates an environment over `settings`, using the system clock, no
    /// install record and no backup.
    #[must_use]
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            settings,
            install_record: Arc::new(StaticInstallRecord::new()),
            backup: Arc::new(NoopBackup),
            clock: Arc::new(SystemClock),
        }
    }

    /// An environment over a fresh [`MemorySettingsStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySettingsStore::new()))
    }

    #[must_use]
    pub fn with_install_record(mut self, install_record: Arc<dyn InstallRecord>) -> Self {
        self.install_record = install_record;
        self
    }

    #[must_use]
    pub fn with_backup(mut self, backup: Arc<dyn BackupTrigger>) -> Self {
        self.backup = backup;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }

    #[must_use]
    pub fn install_record(&self) -> &dyn InstallRecord {
        self.install_record.as_ref()
    }

    #[must_use]
    pub fn backup(&self) -> &dyn BackupTrigger {
        self.backup.as_ref()
    }

    /// Reads the injected clock.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

impl std::fmt::Debug for TrialEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrialEnv")
            .field("now", &self.now())
            .finish_non_exhaustive()
    }
}
