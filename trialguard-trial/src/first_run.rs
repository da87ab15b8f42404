//! Factor that records the resolved trial start in the settings store.
//!
//! The first resolution writes its decision; every later read offers that
//! value back as a candidate, so the trial keeps counting from the first run
//! even when no platform install record is available. The entry is written
//! once and never moved.

use crate::env::TrialEnv;
use crate::error::TrialResult;
use crate::factor::TrialFactor;
use crate::last_checked::DEFAULT_PREFERENCE_FILE;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use trialguard_types::{decode_timestamp, encode_timestamp, Timestamp};

/// Default key for the recorded trial start.
pub const DEFAULT_START_PREFERENCE_NAME: &str = "trial_start";

/// Configuration for [`FirstRunFactor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirstRunConfig {
    /// Settings namespace holding the entry.
    pub preference_file: String,
    /// Key of the entry inside the namespace.
    pub preference_name: String,
    /// Whether to request a backup after the entry is written.
    pub should_trigger_backup: bool,
}

impl Default for FirstRunConfig {
    fn default() -> Self {
        Self {
            preference_file: DEFAULT_PREFERENCE_FILE.to_string(),
            preference_name: DEFAULT_START_PREFERENCE_NAME.to_string(),
            should_trigger_backup: true,
        }
    }
}

impl FirstRunConfig {
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

/// Storage-backed factor remembering the first resolved start.
#[derive(Debug, Clone, Default)]
pub struct FirstRunFactor {
    config: FirstRunConfig,
}

impl FirstRunFactor {
    #[must_use]
    pub fn new(config: FirstRunConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &FirstRunConfig {
        &self.config
    }
}

impl TrialFactor for FirstRunFactor {
    fn name(&self) -> &str {
        "first_run"
    }

    /// Returns the recorded start, [`Timestamp::TRIAL_INVALID`] if it lies in
    /// the future, or [`Timestamp::NOT_AVAILABLE`] if nothing is recorded.
    fn read_timestamp(&self, env: &TrialEnv) -> TrialResult<Timestamp> {
        let cfg = &self.config;
        let Some(raw) = env
            .settings()
            .get(&cfg.preference_file, &cfg.preference_name)?
        else {
            return Ok(Timestamp::NOT_AVAILABLE);
        };

        let start = decode_timestamp(&raw)?;
        if !start.is_literal() {
            return Ok(Timestamp::NOT_AVAILABLE);
        }

        let now = env.now();
        if now < start {
            warn!(
                factor = self.name(),
                now = %now,
                start = %start,
                "clock is behind the recorded trial start, invalidating trial"
            );
            return Ok(Timestamp::TRIAL_INVALID);
        }
        Ok(start)
    }

    /// Writes `timestamp` if it is a literal start and nothing is recorded yet.
    fn persist_timestamp(&self, timestamp: Timestamp, env: &TrialEnv) -> TrialResult<()> {
        let cfg = &self.config;
        if !timestamp.is_literal() {
            return Ok(());
        }
        if env
            .settings()
            .get(&cfg.preference_file, &cfg.preference_name)?
            .is_some()
        {
            return Ok(());
        }

        env.settings().put(
            &cfg.preference_file,
            &cfg.preference_name,
            &encode_timestamp(timestamp),
        )?;
        debug!(factor = self.name(), start = %timestamp, "recorded trial start");

        if cfg.should_trigger_backup {
            env.backup().notify_data_changed();
        }
        Ok(())
    }
}
