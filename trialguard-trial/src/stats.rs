//! Trial status summary handed back to the host application.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use trialguard_types::Timestamp;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Outcome of folding every factor's opinion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartDecision {
    /// The trial started at this literal time.
    Started(Timestamp),
    /// Some factor detected tampering; the trial is over.
    Invalid,
}

impl StartDecision {
    /// The value persisted for this decision.
    #[must_use]
    pub fn as_timestamp(&self) -> Timestamp {
        match self {
            Self::Started(ts) => *ts,
            Self::Invalid => Timestamp::TRIAL_INVALID,
        }
    }

    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }

    /// Start time, unless the trial was invalidated.
    #[must_use]
    pub fn start(&self) -> Option<Timestamp> {
        match self {
            Self::Started(ts) => Some(*ts),
            Self::Invalid => None,
        }
    }
}

/// Whether the trial is over and how much of it is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialStats {
    is_trial_over: bool,
    time_remaining_ms: i64,
}

impl TrialStats {
    /// Computes the status of a trial of `duration_ms` at time `now`.
    ///
    /// An invalidated trial is over with nothing remaining. Otherwise the
    /// trial ends at `start + duration_ms`; arithmetic saturates.
    #[must_use]
    pub fn compute(decision: StartDecision, duration_ms: i64, now: Timestamp) -> Self {
        let Some(start) = decision.start() else {
            return Self {
                is_trial_over: true,
                time_remaining_ms: 0,
            };
        };

        let end = start.saturating_add_millis(duration_ms);
        Self {
            is_trial_over: now >= end,
            time_remaining_ms: end.saturating_millis_since(now).max(0),
        }
    }

    #[must_use]
    pub fn is_trial_over(&self) -> bool {
        self.is_trial_over
    }

    /// Time left in the trial, never negative.
    #[must_use]
    pub fn time_remaining(&self) -> TimeDelta {
        TimeDelta::try_milliseconds(self.time_remaining_ms).unwrap_or(TimeDelta::MAX)
    }

    #[must_use]
    pub fn time_remaining_ms(&self) -> i64 {
        self.time_remaining_ms
    }

    /// Whole days left, rounded down.
    #[must_use]
    pub fn days_remaining(&self) -> u32 {
        u32::try_from(self.time_remaining_ms / MILLIS_PER_DAY).unwrap_or(u32::MAX)
    }
}
