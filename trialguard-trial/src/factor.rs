//! The factor capability: one independent opinion about when a trial began.

use crate::env::TrialEnv;
use crate::error::TrialResult;
use trialguard_types::Timestamp;

/// A source that can report a trial-start candidate and, optionally, record
/// the resolver's final decision.
///
/// Both methods have defaults, so a factor may implement only one of them:
/// reading yields [`Timestamp::NOT_AVAILABLE`] and persisting does nothing.
///
/// A factor keeps no state of its own beyond construction-time config;
/// whatever it remembers lives behind the ports in [`TrialEnv`].
pub trait TrialFactor: Send + Sync {
    /// Short identifier used in logs and resolution reports.
    fn name(&self) -> &str;

    /// Reads this factor's opinion.
    ///
    /// Must return [`Timestamp::NOT_AVAILABLE`] if nothing has been recorded
    /// yet or the record was cleared, and [`Timestamp::TRIAL_INVALID`] instead
    /// of any value it detects as tampered with.
    ///
    /// # Errors
    ///
    /// Only for faults in the backing storage, such as an undecodable value.
    fn read_timestamp(&self, env: &TrialEnv) -> TrialResult<Timestamp> {
        let _ = env;
        Ok(Timestamp::NOT_AVAILABLE)
    }

    /// Records `timestamp`, the resolver's decision, if this factor can.
    ///
    /// Sentinels are valid input. Callers treat failure as non-fatal.
    fn persist_timestamp(&self, timestamp: Timestamp, env: &TrialEnv) -> TrialResult<()> {
        let _ = (timestamp, env);
        Ok(())
    }
}
