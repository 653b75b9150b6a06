//! Time utilities: parsing and formatting HH:MM and session timestamps.

use chrono::{NaiveDateTime, NaiveTime};

/// Storage format for session timestamps.
pub const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_time(t: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(t, "%H:%M").ok()
}

/// `HH:MM`, zero padded so that text comparison in SQL is chronological.
pub fn format_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).ok()
}

pub fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

pub fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
