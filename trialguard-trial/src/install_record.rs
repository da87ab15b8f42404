//! Read-only factor backed by the platform's first-install record.
//!
//! The record survives updates but is reset by a reinstall, so on its own it
//! only bounds the trial for users who never reinstall.

use crate::env::TrialEnv;
use crate::error::{TrialError, TrialResult};
use crate::factor::TrialFactor;
use tracing::{debug, warn};
use trialguard_types::Timestamp;

/// Reports the first-install time of `app_id` as a trial-start candidate.
#[derive(Debug, Clone)]
pub struct InstallRecordFactor {
    app_id: String,
}

impl InstallRecordFactor {
    #[must_use]
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
        }
    }

    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }
}

impl TrialFactor for InstallRecordFactor {
    fn name(&self) -> &str {
        "install_record"
    }

    /// Returns the install time, [`Timestamp::TRIAL_INVALID`] if it lies in
    /// the future, or [`Timestamp::NOT_AVAILABLE`] if the platform cannot
    /// produce it.
    fn read_timestamp(&self, env: &TrialEnv) -> TrialResult<Timestamp> {
        let now = env.now();
        let installed_at = match env.install_record().first_install_time(&self.app_id) {
            Ok(ts) => ts,
            Err(TrialError::InstallRecordNotFound(app_id)) => {
                // An installed app should always find its own record
                debug!(factor = self.name(), app_id = %app_id, "no install record");
                return Ok(Timestamp::NOT_AVAILABLE);
            }
            Err(e) => {
                debug!(factor = self.name(), error = %e, "install record lookup failed");
                return Ok(Timestamp::NOT_AVAILABLE);
            }
        };

        if installed_at > now {
            warn!(
                factor = self.name(),
                now = %now,
                installed_at = %installed_at,
                "install record is in the future, invalidating trial"
            );
            return Ok(Timestamp::TRIAL_INVALID);
        }
        Ok(installed_at)
    }
}
