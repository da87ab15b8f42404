//! Tamper-resistant trial start resolution for TrialGuard.
//!
//! This crate decides when an application's trial began by asking several
//! independent factors and folding their answers:
//! - [`InstallRecordFactor`]: the platform's first-install time
//! - [`FirstRunFactor`]: the start recorded by the first resolution
//! - [`LastCheckedFactor`]: the last check time, used to detect clock rollback
//! - any custom [`TrialFactor`]
//!
//! # Design Principles
//!
//! - **Earliest wins**: the trial started the first time any source saw it,
//!   so clearing one source does not reset the trial
//! - **Tampering dominates**: a single `TRIAL_INVALID` reading ends the trial
//! - **Injected environment**: storage, install record, backup and clock are
//!   passed in through [`TrialEnv`], never looked up globally
//! - **Best-effort persistence**: a failed write is logged, not fatal
//!
//! # Limits
//!
//! Rollback detection only catches obvious backward clock jumps against the
//! same clock an attacker controls. It is not a proof of time.

mod config;
mod env;
mod error;
mod factor;
mod first_run;
mod install_record;
mod last_checked;
mod resolver;
mod stats;

pub use config::{TrialConfig, DEFAULT_TRIAL_DURATION_MS};
pub use env::{
    BackupTrigger, Clock, CountingBackup, InstallRecord, ManualClock, MemorySettingsStore,
    NoopBackup, SettingsStore, StaticInstallRecord, SystemClock, TrialEnv,
};
pub use error::{TrialError, TrialResult};
pub use factor::TrialFactor;
pub use first_run::{FirstRunConfig, FirstRunFactor, DEFAULT_START_PREFERENCE_NAME};
pub use install_record::InstallRecordFactor;
pub use last_checked::{
    LastCheckedConfig, LastCheckedFactor, DEFAULT_PREFERENCE_FILE, DEFAULT_PREFERENCE_NAME,
};
pub use resolver::{fold_readings, FactorReading, Resolution, Resolver, ResolverBuilder};
pub use stats::{StartDecision, TrialStats};
pub use trialguard_types::Timestamp;
