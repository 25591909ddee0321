use chrono::{NaiveTime, Timelike};
use thiserror::Error;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Error, PartialEq)]
pub enum ClockError {
    #[error("malformed time '{0}', expected HH:MM or HH:MM:SS")]
    MalformedTime(String),
    #[error("minute offset {0} falls outside a single day")]
    OutsideDay(i64),
}

/// Parses "HH:MM" or "HH:MM:SS", truncating any seconds to minute
/// granularity.
pub fn parse_time(input: &str) -> Result<NaiveTime, ClockError> {
    let parsed = NaiveTime::parse_from_str(input, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        .map_err(|_| ClockError::MalformedTime(input.to_string()))?;
    from_minutes(to_minutes(parsed))
}

pub fn to_minutes(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

pub fn from_minutes(minutes: u32) -> Result<NaiveTime, ClockError> {
    if minutes >= MINUTES_PER_DAY {
        return Err(ClockError::OutsideDay(minutes as i64));
    }
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
        .ok_or(ClockError::OutsideDay(minutes as i64))
}

/// Same-day arithmetic only; the salon never operates past midnight, so a
/// result outside 00:00-23:59 is an error rather than a rollover.
pub fn add_minutes(time: NaiveTime, delta: i32) -> Result<NaiveTime, ClockError> {
    let total = to_minutes(time) as i64 + delta as i64;
    if total < 0 || total >= MINUTES_PER_DAY as i64 {
        return Err(ClockError::OutsideDay(total));
    }
    from_minutes(total as u32)
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
