use crate::errors::{AppError, AppResult};
use crate::utils::time::{format_time, parse_time};
use chrono::NaiveTime;
use serde::Serialize;

/// Half-open time-of-day range `[start, end)` within a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSlot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> AppResult<Self> {
        if start >= end {
            return Err(AppError::InvalidRange {
                start: format_time(start),
                end: format_time(end),
            });
        }
        Ok(Self { start, end })
    }

    /// Build a slot from a start time and a length in minutes.
    /// The slot must not run past midnight.
    pub fn starting_at(start: NaiveTime, duration_minutes: i64) -> AppResult<Self> {
        if duration_minutes <= 0 {
            return Err(AppError::Validation(format!(
                "duration must be positive, got {} min",
                duration_minutes
            )));
        }
        let (end, wrapped) =
            start.overflowing_add_signed(chrono::Duration::minutes(duration_minutes));
        if wrapped != 0 {
            return Err(AppError::Validation(format!(
                "a {} min slot starting at {} runs past midnight",
                duration_minutes,
                format_time(start)
            )));
        }
        Self::new(start, end)
    }

    /// Parse `HH:MM-HH:MM`.
    pub fn parse(s: &str) -> AppResult<Self> {
        let (a, b) = s
            .split_once('-')
            .ok_or_else(|| AppError::InvalidTime(format!("expected HH:MM-HH:MM, got '{}'", s)))?;
        let start = parse_time(a.trim()).ok_or_else(|| AppError::InvalidTime(a.to_string()))?;
        let end = parse_time(b.trim()).ok_or_else(|| AppError::InvalidTime(b.to_string()))?;
        Self::new(start, end)
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Strict half-open overlap: touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn start_str(&self) -> String {
        format_time(self.start)
    }

    pub fn end_str(&self) -> String {
        format_time(self.end)
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start_str(), self.end_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(s: &str) -> TimeSlot {
        TimeSlot::parse(s).unwrap()
    }

    #[test]
    fn touching_slots_do_not_overlap() {
        assert!(!slot("10:00-11:00").overlaps(&slot("11:00-12:00")));
        assert!(!slot("11:00-12:00").overlaps(&slot("10:00-11:00")));
    }

    #[test]
    fn partial_and_containing_slots_overlap() {
        assert!(slot("10:30-11:30").overlaps(&slot("11:00-12:00")));
        assert!(slot("11:30-12:30").overlaps(&slot("11:00-12:00")));
        assert!(slot("10:00-13:00").overlaps(&slot("11:00-12:00")));
        assert!(slot("11:15-11:45").overlaps(&slot("11:00-12:00")));
        assert!(slot("11:00-12:00").overlaps(&slot("11:00-12:00")));
    }

    #[test]
    fn empty_or_inverted_range_is_rejected() {
        assert!(matches!(
            TimeSlot::parse("11:00-11:00"),
            Err(AppError::InvalidRange { .. })
        ));
        assert!(matches!(
            TimeSlot::parse("12:00-11:00"),
            Err(AppError::InvalidRange { .. })
        ));
        assert!(matches!(
            TimeSlot::parse("1100"),
            Err(AppError::InvalidTime(_))
        ));
    }

    #[test]
    fn starting_at_builds_end_time() {
        let t = parse_time("14:00").unwrap();
        let s = TimeSlot::starting_at(t, 90).unwrap();
        assert_eq!(s.to_string(), "14:00-15:30");
        assert_eq!(s.duration_minutes(), 90);

        let late = parse_time("23:30").unwrap();
        assert!(TimeSlot::starting_at(late, 60).is_err());
        assert!(TimeSlot::starting_at(t, 0).is_err());
    }
}
