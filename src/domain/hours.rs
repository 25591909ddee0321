use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IntervalError {
    #[error("interval end {end} is not after start {start}")]
    EndNotAfterStart { start: NaiveTime, end: NaiveTime },
    #[error("duration of {minutes} minutes is below the {minimum}-minute minimum")]
    TooShort { minutes: i64, minimum: u32 },
    #[error("interval extends past the end of the day")]
    ExtendsPastMidnight,
}

/// A half-open time range within a single day: an interval ending at 10:00
/// does not touch one starting at 10:00. Minute granularity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeInterval {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, IntervalError> {
        if end <= start {
            return Err(IntervalError::EndNotAfterStart { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// The one overlap predicate used everywhere intervals are compared.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, instant: NaiveTime) -> bool {
        self.start <= instant && instant < self.end
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Open/closed window for one weekday. `start` and `end` are meaningless
/// when `closed` is set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub closed: bool,
}

impl WorkingHours {
    pub fn open(start: NaiveTime, end: NaiveTime) -> Result<Self, IntervalError> {
        if end <= start {
            return Err(IntervalError::EndNotAfterStart { start, end });
        }
        Ok(Self {
            start,
            end,
            closed: false,
        })
    }

    pub fn closed() -> Self {
        Self {
            start: NaiveTime::MIN,
            end: NaiveTime::MIN,
            closed: true,
        }
    }

    pub fn open_interval(&self) -> Option<TimeInterval> {
        if self.closed {
            None
        } else {
            Some(TimeInterval {
                start: self.start,
                end: self.end,
            })
        }
    }
}
