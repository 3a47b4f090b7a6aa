//! Shift duration and calendar-day derivation.
//!
//! Timestamps use one fixed local format, `YYYY-MM-DDTHH:MM:SS`, with no
//! timezone offset. A shift's day is the date of its start; a shift that runs
//! past midnight still belongs to the day it started.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{Result, RosterError};
use crate::models::Shift;

/// Wire format of shift timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Parsed time span of a shift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftWindow {
    /// Start time.
    pub start: NaiveDateTime,
    /// End time, strictly after `start`.
    pub end: NaiveDateTime,
    /// Calendar date of `start`.
    pub day: NaiveDate,
    /// Length in hours, positive and finite.
    pub hours: f64,
}

/// Parses a timestamp in [`TIMESTAMP_FORMAT`].
pub fn parse_timestamp(value: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
}

/// Parses both timestamps of a shift and derives its length and day.
///
/// # Errors
/// [`RosterError::MalformedTimestamp`] if either timestamp does not parse or
/// the end is not strictly after the start.
pub fn shift_window(shift: &Shift) -> Result<ShiftWindow> {
    let start = parse_field(shift, &shift.start_time)?;
    let end = parse_field(shift, &shift.end_time)?;

    let seconds = (end - start).num_seconds();
    if seconds <= 0 {
        return Err(RosterError::MalformedTimestamp {
            shift_id: shift.id.clone(),
            value: format!("{} -> {}", shift.start_time, shift.end_time),
            reason: "end_time must be strictly after start_time".to_string(),
        });
    }

    Ok(ShiftWindow {
        start,
        end,
        day: start.date(),
        hours: seconds as f64 / SECONDS_PER_HOUR,
    })
}

/// Shift length in hours.
pub fn shift_hours(shift: &Shift) -> Result<f64> {
    shift_window(shift).map(|w| w.hours)
}

/// Calendar day a shift is counted against.
pub fn shift_day(shift: &Shift) -> Result<NaiveDate> {
    shift_window(shift).map(|w| w.day)
}

fn parse_field(shift: &Shift, value: &str) -> Result<NaiveDateTime> {
    parse_timestamp(value).map_err(|e| RosterError::MalformedTimestamp {
        shift_id: shift.id.clone(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift(start: &str, end: &str) -> Shift {
        Shift::new("S1", "nurse", start, end)
    }

    #[test]
    fn test_hours() {
        let s = shift("2024-03-01T08:00:00", "2024-03-01T12:00:00");
        assert!((shift_hours(&s).unwrap() - 4.0).abs() < 1e-10);

        let s = shift("2024-03-01T08:00:00", "2024-03-01T08:20:00");
        assert!((shift_hours(&s).unwrap() - 1.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_overnight_shift_belongs_to_start_day() {
        let s = shift("2024-03-01T22:00:00", "2024-03-02T06:00:00");
        let w = shift_window(&s).unwrap();
        assert!((w.hours - 8.0).abs() < 1e-10);
        assert_eq!(w.day, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(shift_day(&s).unwrap(), w.day);
    }

    #[test]
    fn test_zero_duration_rejected() {
        let s = shift("2024-03-01T08:00:00", "2024-03-01T08:00:00");
        assert!(matches!(
            shift_hours(&s),
            Err(RosterError::MalformedTimestamp { .. })
        ));
    }

    #[test]
    fn test_negative_duration_rejected() {
        let s = shift("2024-03-01T12:00:00", "2024-03-01T08:00:00");
        assert!(matches!(
            shift_window(&s),
            Err(RosterError::MalformedTimestamp { .. })
        ));
    }

    #[test]
    fn test_unparseable_timestamp() {
        for bad in ["2024-03-01 08:00:00", "2024-03-01T08:00", "08:00", "", "2024-02-30T08:00:00"] {
            let s = shift(bad, "2024-03-01T12:00:00");
            match shift_hours(&s) {
                Err(RosterError::MalformedTimestamp { shift_id, value, .. }) => {
                    assert_eq!(shift_id, "S1");
                    assert_eq!(value, bad);
                }
                other => panic!("expected MalformedTimestamp for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_timezone_suffix_rejected() {
        let s = shift("2024-03-01T08:00:00Z", "2024-03-01T12:00:00");
        assert!(shift_hours(&s).is_err());
    }
}
