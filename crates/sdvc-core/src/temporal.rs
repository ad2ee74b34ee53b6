//! # Temporal Types: UTC-Only Timestamps
//!
//! Defines `Timestamp`, a UTC-only timestamp truncated to seconds.
//!
//! JWT registered claims (`iat`, `exp`, `nbf`) are NumericDate values, i.e.
//! whole epoch seconds. Keeping sub-second precision out of the type means a
//! timestamp written into a payload and read back compares equal.

use chrono::{DateTime, TimeDelta, Timelike, Utc};

use crate::error::TimestampError;

/// A UTC-only timestamp, truncated to seconds precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp from the current UTC time, truncated to seconds.
    pub fn now() -> Self {
        let now = Utc::now();
        Self(now.with_nanosecond(0).unwrap_or(now))
    }

    /// Create a timestamp from a JWT NumericDate (epoch seconds).
    pub fn from_epoch_secs(secs: i64) -> Result<Self, TimestampError> {
        DateTime::from_timestamp(secs, 0)
            .map(Self)
            .ok_or(TimestampError::OutOfRange(secs))
    }

    /// Returns the Unix epoch timestamp in seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Returns this timestamp shifted by `secs` seconds.
    ///
    /// # Errors
    ///
    /// [`TimestampError::OverflowedShift`] when the result leaves the range
    /// chrono can represent.
    pub fn plus_secs(&self, secs: i64) -> Result<Self, TimestampError> {
        TimeDelta::try_seconds(secs)
            .and_then(|delta| self.0.checked_add_signed(delta))
            .map(Self)
            .ok_or(TimestampError::OverflowedShift(secs))
    }
}
