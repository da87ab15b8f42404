//! Millisecond timestamps with reserved sentinel values.
//!
//! A [`Timestamp`] is a signed count of milliseconds since the Unix epoch.
//! The two extremal `i64` values are reserved:
//! - [`Timestamp::NOT_AVAILABLE`] (`i64::MAX`): a source has no opinion
//! - [`Timestamp::TRIAL_INVALID`] (`i64::MIN`): a source detected tampering
//!
//! Wall-clock readings never reach either bound, so sentinels are told apart
//! from literal points in time by equality alone.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds since the Unix epoch, or one of the two sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// "No opinion". Ignored when folding candidates, but still valid to persist.
    pub const NOT_AVAILABLE: Self = Self(i64::MAX);

    /// "Expire the trial now". Dominates every other candidate.
    pub const TRIAL_INVALID: Self = Self(i64::MIN);

    /// Creates a timestamp from raw milliseconds.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the raw millisecond value, sentinels included.
    #[must_use]
    pub const fn millis(&self) -> i64 {
        self.0
    }

    /// Returns true for [`Timestamp::NOT_AVAILABLE`].
    #[must_use]
    pub const fn is_not_available(&self) -> bool {
        self.0 == i64::MAX
    }

    /// Returns true for [`Timestamp::TRIAL_INVALID`].
    #[must_use]
    pub const fn is_trial_invalid(&self) -> bool {
        self.0 == i64::MIN
    }

    /// Returns true if this is a literal point in time rather than a sentinel.
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        !self.is_not_available() && !self.is_trial_invalid()
    }

    /// Adds `millis`, clamping at the `i64` bounds.
    #[must_use]
    pub const fn saturating_add_millis(&self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Milliseconds from `earlier` to `self`, clamping at the `i64` bounds.
    #[must_use]
    pub const fn saturating_millis_since(&self, earlier: Self) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Converts a UTC datetime into a timestamp.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }

    /// Converts a literal timestamp into a UTC datetime.
    ///
    /// Returns `None` for sentinels and for values chrono cannot represent.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        if !self.is_literal() {
            return None;
        }
        Utc.timestamp_millis_opt(self.0).single()
    }
}

impl From<i64> for Timestamp {
    fn from(millis: i64) -> Self {
        Self(millis)
    }
}

impl From<Timestamp> for i64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_not_available() {
            f.write_str("NOT_AVAILABLE")
        } else if self.is_trial_invalid() {
            f.write_str("TRIAL_INVALID")
        } else {
            write!(f, "{}ms", self.0)
        }
    }
}
