//! Shared test helpers for trial tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use trialguard_trial::{
    CountingBackup, ManualClock, MemorySettingsStore, SettingsStore, StaticInstallRecord,
    Timestamp, TrialEnv, TrialError, TrialFactor, TrialResult,
};

pub const APP_ID: &str = "com.example.notes";
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;
/// 2023-11-14T22:13:20Z
pub const T0: i64 = 1_700_000_000_000;

/// A fully fake environment with handles kept for inspection.
pub struct Fixture {
    pub env: TrialEnv,
    pub store: Arc<MemorySettingsStore>,
    pub clock: Arc<ManualClock>,
    pub backup: Arc<CountingBackup>,
}

impl Fixture {
    /// Clock at `now`, empty store, no install record.
    pub fn at(now: i64) -> Self {
        Self::with_install_record(now, StaticInstallRecord::new())
    }

    /// Clock at `now`, with `APP_ID` installed at `installed_at`.
    pub fn installed_at(now: i64, installed_at: i64) -> Self {
        Self::with_install_record(
            now,
            StaticInstallRecord::new().with(APP_ID, Timestamp::from_millis(installed_at)),
        )
    }

    fn with_install_record(now: i64, record: StaticInstallRecord) -> Self {
        let store = Arc::new(MemorySettingsStore::new());
        let clock = Arc::new(ManualClock::new(Timestamp::from_millis(now)));
        let backup = Arc::new(CountingBackup::new());
        let env = TrialEnv::new(store.clone())
            .with_clock(clock.clone())
            .with_backup(backup.clone())
            .with_install_record(Arc::new(record));
        Self {
            env,
            store,
            clock,
            backup,
        }
    }
}

/// A factor with a fixed opinion that records what it was asked to persist.
pub struct FixedFactor {
    name: String,
    reading: Timestamp,
    pub persisted: Arc<Mutex<Vec<Timestamp>>>,
}

impl FixedFactor {
    pub fn new(name: &str, reading: Timestamp) -> Self {
        Self {
            name: name.to_string(),
            reading,
            persisted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn millis(name: &str, reading: i64) -> Self {
        Self::new(name, Timestamp::from_millis(reading))
    }
}

impl TrialFactor for FixedFactor {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_timestamp(&self, _env: &TrialEnv) -> TrialResult<Timestamp> {
        Ok(self.reading)
    }

    fn persist_timestamp(&self, timestamp: Timestamp, _env: &TrialEnv) -> TrialResult<()> {
        self.persisted.lock().unwrap().push(timestamp);
        Ok(())
    }
}

/// A factor that overrides nothing but its name.
pub struct BareFactor;

impl TrialFactor for BareFactor {
    fn name(&self) -> &str {
        "bare"
    }
}

/// A settings store whose writes always fail.
#[derive(Default)]
pub struct ReadOnlyStore {
    pub inner: MemorySettingsStore,
}

impl SettingsStore for ReadOnlyStore {
    fn get(&self, namespace: &str, key: &str) -> TrialResult<Option<String>> {
        self.inner.get(namespace, key)
    }

    fn put(&self, _namespace: &str, _key: &str, _value: &str) -> TrialResult<()> {
        Err(TrialError::Storage("disk full".to_string()))
    }
}

/// Installs a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
