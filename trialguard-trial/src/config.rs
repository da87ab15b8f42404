//! Trial configuration, optionally loaded from a `trial.toml` file.
//!
//! ```toml
//! [trial]
//! app-id = "com.example.notes"
//! duration-days = 14
//! install-record = true
//!
//! [trial.first-run]
//! preference-name = "trial_start"
//!
//! [trial.last-checked]
//! preference-file = "simple_trial"
//! preference-name = "last_check"
//! trigger-backup = true
//! ```
//!
//! Unlike most settings files, a config that exists but cannot be read is an
//! error: silently falling back to defaults could move the trial's storage key
//! and with it the recorded history.

use crate::error::{TrialError, TrialResult};
use crate::first_run::FirstRunConfig;
use crate::last_checked::LastCheckedConfig;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Default trial length (14 days).
pub const DEFAULT_TRIAL_DURATION_MS: i64 = 14 * 24 * 60 * 60 * 1000;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Everything needed to build the default resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialConfig {
    /// Identity used to look up the platform install record.
    pub app_id: String,
    /// Length of the trial in milliseconds.
    pub trial_duration_ms: i64,
    /// Whether to consult the platform install record.
    pub install_record: bool,
    /// Settings for the recorded-start factor.
    pub first_run: FirstRunConfig,
    /// Settings for the last-check factor.
    pub last_checked: LastCheckedConfig,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            app_id: "trialguard".to_string(),
            trial_duration_ms: DEFAULT_TRIAL_DURATION_MS,
            install_record: true,
            first_run: FirstRunConfig::default(),
            last_checked: LastCheckedConfig::default(),
        }
    }
}

impl TrialConfig {
    /// Default config for `app_id`.
    #[must_use]
    pub fn for_app(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn trial_duration(mut self, duration: TimeDelta) -> Self {
        self.trial_duration_ms = duration.num_milliseconds();
        self
    }

    #[must_use]
    pub fn install_record(mut self, enabled: bool) -> Self {
        self.install_record = enabled;
        self
    }

    #[must_use]
    pub fn first_run(mut self, first_run: FirstRunConfig) -> Self {
        self.first_run = first_run;
        self
    }

    #[must_use]
    pub fn last_checked(mut self, last_checked: LastCheckedConfig) -> Self {
        self.last_checked = last_checked;
        self
    }

    /// Loads config from `path`, or returns the defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, does not parse, or fails
    /// [`TrialConfig::validate`].
    pub fn load_from(path: impl AsRef<Path>) -> TrialResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No trial config found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        info!("Loaded trial config from {:?}", path);
        Ok(config)
    }

    /// Parses and validates a `trial.toml` document.
    pub fn from_toml_str(contents: &str) -> TrialResult<Self> {
        let file: ConfigFile = toml::from_str(contents)?;
        let config = file.into_config()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> TrialResult<()> {
        if self.app_id.trim().is_empty() {
            return Err(TrialError::InvalidConfig("app id is empty".to_string()));
        }
        if self.trial_duration_ms <= 0 {
            return Err(TrialError::InvalidConfig(format!(
                "trial duration must be positive, got {}ms",
                self.trial_duration_ms
            )));
        }
        let keys = [
            (&self.first_run.preference_file, &self.first_run.preference_name),
            (&self.last_checked.preference_file, &self.last_checked.preference_name),
        ];
        for (file, name) in keys {
            if file.is_empty() {
                return Err(TrialError::InvalidConfig(
                    "preference file is empty".to_string(),
                ));
            }
            if name.is_empty() {
                return Err(TrialError::InvalidConfig(
                    "preference name is empty".to_string(),
                ));
            }
        }
        if self.first_run.preference_file == self.last_checked.preference_file
            && self.first_run.preference_name == self.last_checked.preference_name
        {
            return Err(TrialError::InvalidConfig(
                "first-run and last-checked share a settings key".to_string(),
            ));
        }
        Ok(())
    }

    /// Trial length as a duration.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        TimeDelta::try_milliseconds(self.trial_duration_ms).unwrap_or(TimeDelta::MAX)
    }
}

// ── File format ──────────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    trial: TrialSection,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct TrialSection {
    app_id: Option<String>,
    duration_days: Option<u32>,
    duration_ms: Option<i64>,
    install_record: Option<bool>,
    #[serde(default)]
    first_run: StorageSection,
    #[serde(default)]
    last_checked: StorageSection,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
struct StorageSection {
    preference_file: Option<String>,
    preference_name: Option<String>,
    trigger_backup: Option<bool>,
}

impl ConfigFile {
    fn into_config(self) -> TrialResult<TrialConfig> {
        let section = self.trial;
        let mut config = TrialConfig::default();

        if let Some(app_id) = section.app_id {
            config.app_id = app_id;
        }
        config.trial_duration_ms = match (section.duration_days, section.duration_ms) {
            (Some(_), Some(_)) => {
                return Err(TrialError::InvalidConfig(
                    "set either duration-days or duration-ms, not both".to_string(),
                ));
            }
            (Some(days), None) => i64::from(days) * MILLIS_PER_DAY,
            (None, Some(ms)) => ms,
            (None, None) => DEFAULT_TRIAL_DURATION_MS,
        };
        if let Some(enabled) = section.install_record {
            config.install_record = enabled;
        }

        let fr = section.first_run;
        if let Some(file) = fr.preference_file {
            config.first_run.preference_file = file;
        }
        if let Some(name) = fr.preference_name {
            config.first_run.preference_name = name;
        }
        if let Some(backup) = fr.trigger_backup {
            config.first_run.should_trigger_backup = backup;
        }

        let lc = section.last_checked;
        if let Some(file) = lc.preference_file {
            config.last_checked.preference_file = file;
        }
        if let Some(name) = lc.preference_name {
            config.last_checked.preference_name = name;
        }
        if let Some(backup) = lc.trigger_backup {
            config.last_checked.should_trigger_backup = backup;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = TrialConfig::from_toml_str("").unwrap();
        assert_eq!(config, TrialConfig::default());
    }

    #[test]
    fn full_document_is_applied() {
        let toml_str = r#"
[trial]
app-id = "com.example.notes"
duration-days = 7
install-record = false

[trial.first-run]
preference-name = "started"

[trial.last-checked]
preference-file = "notes_trial"
preference-name = "seen"
trigger-backup = false
"#;
        let config = TrialConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.app_id, "com.example.notes");
        assert_eq!(config.trial_duration_ms, 7 * MILLIS_PER_DAY);
        assert!(!config.install_record);
        assert_eq!(config.first_run.preference_name, "started");
        assert_eq!(config.first_run.preference_file, "simple_trial");
        assert_eq!(config.last_checked.preference_file, "notes_trial");
        assert_eq!(config.last_checked.preference_name, "seen");
        assert!(!config.last_checked.should_trigger_backup);
    }

    #[test]
    fn both_durations_rejected() {
        let toml_str = "[trial]\nduration-days = 7\nduration-ms = 1000\n";
        assert!(matches!(
            TrialConfig::from_toml_str(toml_str),
            Err(TrialError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_duration_rejected() {
        let toml_str = "[trial]\nduration-ms = 0\n";
        assert!(matches!(
            TrialConfig::from_toml_str(toml_str),
            Err(TrialError::InvalidConfig(_))
        ));
    }

    #[test]
    fn shared_storage_key_rejected() {
        let toml_str = "[trial.first-run]\npreference-name = \"last_check\"\n";
        assert!(matches!(
            TrialConfig::from_toml_str(toml_str),
            Err(TrialError::InvalidConfig(_))
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            TrialConfig::from_toml_str("[trial\napp-id ="),
            Err(TrialError::ConfigParse(_))
        ));
    }
}
