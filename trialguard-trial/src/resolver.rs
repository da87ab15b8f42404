//! Folds every factor's opinion into one trial-start decision.
//!
//! Resolution runs in three passes:
//! 1. Every factor is read. No read is skipped, since each factor's persist
//!    depends on its own prior state.
//! 2. The readings are folded: any [`Timestamp::TRIAL_INVALID`] invalidates
//!    the trial, otherwise the earliest literal reading wins, and with no
//!    literal reading at all the trial starts now.
//! 3. The decision is handed to every factor's persist. Persist failures are
//!    logged and otherwise ignored.

use crate::config::{TrialConfig, DEFAULT_TRIAL_DURATION_MS};
use crate::env::TrialEnv;
use crate::error::{TrialError, TrialResult};
use crate::factor::TrialFactor;
use crate::first_run::FirstRunFactor;
use crate::install_record::InstallRecordFactor;
use crate::last_checked::LastCheckedFactor;
use crate::stats::{StartDecision, TrialStats};
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use trialguard_types::Timestamp;

/// Folds factor readings taken at `now` into a decision.
#[must_use]
pub fn fold_readings<I>(readings: I, now: Timestamp) -> StartDecision
where
    I: IntoIterator<Item = Timestamp>,
{
    let mut earliest: Option<Timestamp> = None;
    for ts in readings {
        if ts.is_trial_invalid() {
            return StartDecision::Invalid;
        }
        if ts.is_not_available() {
            continue;
        }
        earliest = Some(earliest.map_or(ts, |e| e.min(ts)));
    }
    StartDecision::Started(earliest.unwrap_or(now))
}

/// One factor's reading during a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorReading {
    /// Name reported by [`TrialFactor::name`].
    pub factor: String,
    /// The factor's opinion, sentinels included.
    pub timestamp: Timestamp,
}

/// Result of a single resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    decision: StartDecision,
    now: Timestamp,
    readings: Vec<FactorReading>,
}

impl Resolution {
    #[must_use]
    pub fn decision(&self) -> StartDecision {
        self.decision
    }

    /// Clock reading the decision was made against.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Readings in factor order.
    #[must_use]
    pub fn readings(&self) -> &[FactorReading] {
        &self.readings
    }

    /// Trial status for a trial of `duration_ms`, evaluated at [`Resolution::now`].
    #[must_use]
    pub fn stats(&self, duration_ms: i64) -> TrialStats {
        TrialStats::compute(self.decision, duration_ms, self.now)
    }
}

/// Combines an ordered list of factors into trial status.
pub struct Resolver {
    env: TrialEnv,
    factors: Vec<Box<dyn TrialFactor>>,
    trial_duration_ms: i64,
}

impl Resolver {
    #[must_use]
    pub fn builder(env: TrialEnv) -> ResolverBuilder {
        ResolverBuilder::new(env)
    }

    /// Builds the default factor list from `config`: the install record (if
    /// enabled), the recorded first-run start, and the last-check factor.
    pub fn from_config(env: TrialEnv, config: &TrialConfig) -> TrialResult<Self> {
        config.validate()?;
        let mut builder = Self::builder(env).trial_duration_ms(config.trial_duration_ms);
        if config.install_record {
            builder = builder.factor(InstallRecordFactor::new(config.app_id.clone()));
        }
        builder
            .factor(FirstRunFactor::new(config.first_run.clone()))
            .factor(LastCheckedFactor::new(config.last_checked.clone()))
            .build()
    }

    #[must_use]
    pub fn env(&self) -> &TrialEnv {
        &self.env
    }

    #[must_use]
    pub fn trial_duration_ms(&self) -> i64 {
        self.trial_duration_ms
    }

    /// Names of the configured factors, in order.
    pub fn factor_names(&self) -> impl Iterator<Item = &str> {
        self.factors.iter().map(|f| f.name())
    }

    /// Reads every factor, decides, and persists the decision.
    ///
    /// # Errors
    ///
    /// Returns an error if any factor read fails (e.g. a corrupted persisted
    /// value). Persist failures never fail the call.
    pub fn resolve(&self) -> TrialResult<Resolution> {
        let now = self.env.now();

        let mut readings = Vec::with_capacity(self.factors.len());
        for factor in &self.factors {
            let timestamp = factor.read_timestamp(&self.env)?;
            debug!(factor = factor.name(), reading = %timestamp, "factor read");
            readings.push(FactorReading {
                factor: factor.name().to_string(),
                timestamp,
            });
        }

        let decision = fold_readings(readings.iter().map(|r| r.timestamp), now);
        let persisted = decision.as_timestamp();
        debug!(decision = %persisted, "trial start resolved");

        for factor in &self.factors {
            if let Err(e) = factor.persist_timestamp(persisted, &self.env) {
                warn!(factor = factor.name(), error = %e, "failed to persist trial decision");
            }
        }

        Ok(Resolution {
            decision,
            now,
            readings,
        })
    }

    /// Resolves and converts the decision into [`TrialStats`].
    ///
    /// # Errors
    ///
    /// Same as [`Resolver::resolve`].
    pub fn check(&self) -> TrialResult<TrialStats> {
        Ok(self.resolve()?.stats(self.trial_duration_ms))
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("factors", &self.factor_names().collect::<Vec<_>>())
            .field("trial_duration_ms", &self.trial_duration_ms)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Resolver`] with a custom factor list.
pub struct ResolverBuilder {
    env: TrialEnv,
    factors: Vec<Box<dyn TrialFactor>>,
    trial_duration_ms: i64,
}

impl ResolverBuilder {
    #[must_use]
    pub fn new(env: TrialEnv) -> Self {
        Self {
            env,
            factors: Vec::new(),
            trial_duration_ms: DEFAULT_TRIAL_DURATION_MS,
        }
    }

    /// Appends a factor. Order only affects logs and reports.
    #[must_use]
    pub fn factor(mut self, factor: impl TrialFactor + 'static) -> Self {
        self.factors.push(Box::new(factor));
        self
    }

    #[must_use]
    pub fn boxed_factor(mut self, factor: Box<dyn TrialFactor>) -> Self {
        self.factors.push(factor);
        self
    }

    #[must_use]
    pub fn trial_duration(self, duration: TimeDelta) -> Self {
        self.trial_duration_ms(duration.num_milliseconds())
    }

    #[must_use]
    pub fn trial_duration_ms(mut self, millis: i64) -> Self {
        self.trial_duration_ms = millis;
        self
    }

    /// # Errors
    ///
    /// Returns [`TrialError::InvalidConfig`] for a non-positive duration.
    pub fn build(self) -> TrialResult<Resolver> {
        if self.trial_duration_ms <= 0 {
            return Err(TrialError::InvalidConfig(format!(
                "trial duration must be positive, got {}ms",
                self.trial_duration_ms
            )));
        }
        Ok(Resolver {
            env: self.env,
            factors: self.factors,
            trial_duration_ms: self.trial_duration_ms,
        })
    }
}
