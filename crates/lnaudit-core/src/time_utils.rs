use chrono::{Local, NaiveDateTime, TimeDelta};
use serde::Serialize;

use crate::RunConfigError;

/// Timestamp layout written at the start of every lnd log record.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Returns the current wall-clock time in the local zone with the offset dropped.
///
/// lnd stamps log records in local time without an offset, so comparisons
/// against parsed log timestamps must use the same naive local clock.
pub fn current_local_timestamp() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Lower time bound for one audit run: `now - lookback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeCutoff {
    now: NaiveDateTime,
    cutoff: NaiveDateTime,
}

impl TimeCutoff {
    /// Builds the cutoff `lookback_days` before `now`.
    pub fn from_lookback_days(
        now: NaiveDateTime,
        lookback_days: u32,
    ) -> Result<Self, RunConfigError> {
        let cutoff = TimeDelta::try_days(i64::from(lookback_days))
            .and_then(|lookback| now.checked_sub_signed(lookback))
            .ok_or(RunConfigError::LookbackOutOfRange { lookback_days })?;
        Ok(Self { now, cutoff })
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn cutoff(&self) -> NaiveDateTime {
        self.cutoff
    }

    /// Returns true when `timestamp` is inside the window. A record exactly at
    /// the cutoff is included.
    pub fn includes(&self, timestamp: NaiveDateTime) -> bool {
        timestamp >= self.cutoff
    }
}
