//! Simulation time window.

use chrono::NaiveDate;
use thiserror::Error;

/// The inclusive range of days for which exposure is simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TimeWindowError> {
        if end < start {
            return Err(TimeWindowError::EndBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    /// Number of simulated days, both endpoints inclusive.
    pub fn num_days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }

    /// Day offset of the window start relative to 1970-01-01.
    pub fn epoch_offset_days(&self) -> i64 {
        (self.start - NaiveDate::default()).num_days()
    }
}

#[derive(Debug, Error)]
pub enum TimeWindowError {
    #[error("simulation end {end} lies before simulation start {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}
