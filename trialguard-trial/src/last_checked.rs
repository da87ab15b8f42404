//! Factor that remembers the last check time and infers clock rollback.
//!
//! Every persist records "now". If a later read finds that recorded time
//! ahead of the clock, the device date was moved backwards since the last
//! check, presumably to stretch the trial, and the factor reports
//! [`Timestamp::TRIAL_INVALID`]. Setting the date back by accident trips
//! the same wire.
//!
//! The recorded value is never offered as a trial-start candidate; a healthy
//! read always yields [`Timestamp::NOT_AVAILABLE`].
//!
//! The settings entry disappears when the user wipes app data, unless the
//! host's backup mechanism restores it. With `should_trigger_backup` set, each
//! persist asks for such a backup.

use crate::env::TrialEnv;
use crate::error::TrialResult;
use crate::factor::TrialFactor;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use trialguard_types::{decode_timestamp, encode_timestamp, Timestamp};

/// Default settings namespace for the last-check entry.
pub const DEFAULT_PREFERENCE_FILE: &str = "simple_trial";

/// Default key for the last-check entry.
pub const DEFAULT_PREFERENCE_NAME: &str = "last_check";

/// Configuration for [`LastCheckedFactor`].
///
/// With the defaults, the timestamp is stored under
/// [`DEFAULT_PREFERENCE_NAME`] in [`DEFAULT_PREFERENCE_FILE`] and a backup
/// is requested after every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LastCheckedConfig {
    /// Settings namespace holding the entry.
    pub preference_file: String,
    /// Key of the entry inside the namespace.
    pub preference_name: String,
    /// Whether to request a backup after each write.
    pub should_trigger_backup: bool,
}

impl Default for LastCheckedConfig {
    fn default() -> Self {
        Self {
            preference_file: DEFAULT_PREFERENCE_FILE.to_string(),
            preference_name: DEFAULT_PREFERENCE_NAME.to_string(),
            should_trigger_backup: true,
        }
    }
}

impl LastCheckedConfig {
    #[must_use]
    pub fn preference_file(mut self, preference_file: impl Into<String>) -> Self {
        self.preference_file = preference_file.into();
        self
    }

    #[must_use]
    pub fn preference_name(mut self, preference_name: impl Into<String>) -> Self {
        self.preference_name = preference_name.into();
        self
    }

    #[must_use]
    pub fn should_trigger_backup(mut self, should_trigger_backup: bool) -> Self {
        self.should_trigger_backup = should_trigger_backup;
        self
    }
}

/// Storage-backed factor with rollback detection.
#[derive(Debug, Clone)]
pub struct LastCheckedFactor {
    config: LastCheckedConfig,
}

impl LastCheckedFactor {
    #[must_use]
    pub fn new(config: LastCheckedConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &LastCheckedConfig {
        &self.config
    }
}

impl Default for LastCheckedFactor {
    fn default() -> Self {
        Self::new(LastCheckedConfig::default())
    }
}

impl TrialFactor for LastCheckedFactor {
    fn name(&self) -> &str {
        "last_checked"
    }

    /// Returns [`Timestamp::TRIAL_INVALID`] if the stored last-check time is
    /// ahead of the clock, [`Timestamp::NOT_AVAILABLE`] otherwise.
    ///
    /// A stored `NOT_AVAILABLE`, bare or encoded, reads as "no opinion" rather
    /// than as a last check far in the future.
    fn read_timestamp(&self, env: &TrialEnv) -> TrialResult<Timestamp> {
        let cfg = &self.config;
        let Some(raw) = env
            .settings()
            .get(&cfg.preference_file, &cfg.preference_name)?
        else {
            return Ok(Timestamp::NOT_AVAILABLE);
        };

        // Bare decimal form, as written by hosts that seeded the entry by hand
        if raw.trim() == Timestamp::NOT_AVAILABLE.millis().to_string() {
            return Ok(Timestamp::NOT_AVAILABLE);
        }

        let last_check = decode_timestamp(&raw)?;
        if last_check.is_not_available() {
            return Ok(Timestamp::NOT_AVAILABLE);
        }

        let now = env.now();
        if now < last_check {
            warn!(
                factor = self.name(),
                now = %now,
                last_check = %last_check,
                "clock is behind the last recorded check, invalidating trial"
            );
            return Ok(Timestamp::TRIAL_INVALID);
        }
        Ok(Timestamp::NOT_AVAILABLE)
    }

    /// Records the current time while no rollback is detected, and
    /// [`Timestamp::TRIAL_INVALID`] otherwise. `timestamp` is ignored.
    ///
    /// The invalid marker only holds for one cycle: it decodes to `i64::MIN`,
    /// which no clock reading is behind, so the following read reports
    /// [`Timestamp::NOT_AVAILABLE`] again.
    fn persist_timestamp(&self, _timestamp: Timestamp, env: &TrialEnv) -> TrialResult<()> {
        let cfg = &self.config;
        let is_trial_valid = self.read_timestamp(env)?.is_not_available();
        let value = if is_trial_valid {
            env.now()
        } else {
            Timestamp::TRIAL_INVALID
        };

        env.settings().put(
            &cfg.preference_file,
            &cfg.preference_name,
            &encode_timestamp(value),
        )?;
        debug!(factor = self.name(), value = %value, "recorded last check");

        if cfg.should_trigger_backup {
            env.backup().notify_data_changed();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{ManualClock, MemorySettingsStore, SettingsStore};
    use std::sync::Arc;

    fn env_at(millis: i64) -> (TrialEnv, Arc<MemorySettingsStore>, Arc<ManualClock>) {
        let store = Arc::new(MemorySettingsStore::new());
        let clock = Arc::new(ManualClock::new(Timestamp::from_millis(millis)));
        let env = TrialEnv::new(store.clone()).with_clock(clock.clone());
        (env, store, clock)
    }

    #[test]
    fn bare_decimal_not_available_is_accepted() {
        let (env, store, _) = env_at(10_000);
        store
            .put(
                DEFAULT_PREFERENCE_FILE,
                DEFAULT_PREFERENCE_NAME,
                &i64::MAX.to_string(),
            )
            .unwrap();
        let factor = LastCheckedFactor::default();
        assert_eq!(factor.read_timestamp(&env).unwrap(), Timestamp::NOT_AVAILABLE);
    }

    #[test]
    fn encoded_not_available_is_accepted() {
        let (env, store, _) = env_at(10_000);
        store
            .put(
                DEFAULT_PREFERENCE_FILE,
                DEFAULT_PREFERENCE_NAME,
                &encode_timestamp(Timestamp::NOT_AVAILABLE),
            )
            .unwrap();
        let factor = LastCheckedFactor::default();
        assert_eq!(factor.read_timestamp(&env).unwrap(), Timestamp::NOT_AVAILABLE);
    }

    #[test]
    fn equal_time_is_not_a_rollback() {
        let (env, store, _) = env_at(10_000);
        store
            .put(
                DEFAULT_PREFERENCE_FILE,
                DEFAULT_PREFERENCE_NAME,
                &encode_timestamp(Timestamp::from_millis(10_000)),
            )
            .unwrap();
        let factor = LastCheckedFactor::default();
        assert_eq!(factor.read_timestamp(&env).unwrap(), Timestamp::NOT_AVAILABLE);
    }

    #[test]
    fn config_builder_overrides_defaults() {
        let cfg = LastCheckedConfig::default()
            .preference_file("prefs")
            .preference_name("seen")
            .should_trigger_backup(false);
        assert_eq!(cfg.preference_file, "prefs");
        assert_eq!(cfg.preference_name, "seen");
        assert!(!cfg.should_trigger_backup);
    }
}
