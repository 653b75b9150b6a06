//! Station availability for a date and a half-open time slot.

use crate::db::queries::find_conflicts;
use crate::errors::{AppError, AppResult};
use crate::models::booking::Booking;
use crate::models::time_slot::TimeSlot;
use chrono::NaiveDate;
use rusqlite::Connection;
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Availability {
    pub available_ids: Vec<String>,
    pub unavailable_ids: Vec<String>,
}

impl Availability {
    pub fn is_available(&self, station_id: &str) -> bool {
        self.available_ids.iter().any(|s| s == station_id)
    }

    pub fn all_available(&self) -> bool {
        self.unavailable_ids.is_empty()
    }

    /// Same verdict for every station: used when the store cannot answer.
    pub fn uniform(station_ids: &[String], available: bool) -> Self {
        if available {
            Self {
                available_ids: station_ids.to_vec(),
                unavailable_ids: Vec::new(),
            }
        } else {
            Self {
                available_ids: Vec::new(),
                unavailable_ids: station_ids.to_vec(),
            }
        }
    }
}

/// Reject an empty request and collapse duplicated ids, keeping first-seen order.
pub fn normalize_station_ids(station_ids: &[String]) -> AppResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for id in station_ids {
        let id = id.trim();
        if id.is_empty() {
            return Err(AppError::Validation("station id must not be empty".into()));
        }
        if seen.insert(id.to_string()) {
            out.push(id.to_string());
        }
    }

    if out.is_empty() {
        return Err(AppError::Validation(
            "at least one station must be requested".into(),
        ));
    }
    Ok(out)
}

/// Split `station_ids` by whether any of `conflicts` sits on them.
pub fn partition(station_ids: &[String], conflicts: &[Booking]) -> Availability {
    let busy: HashSet<&str> = conflicts.iter().map(|b| b.station_id.as_str()).collect();

    let (unavailable_ids, available_ids): (Vec<String>, Vec<String>) = station_ids
        .iter()
        .cloned()
        .partition(|id| busy.contains(id.as_str()));

    Availability {
        available_ids,
        unavailable_ids,
    }
}

/// Read-only availability query against the current store state.
pub fn check_availability(
    conn: &Connection,
    station_ids: &[String],
    date: &NaiveDate,
    slot: &TimeSlot,
) -> AppResult<Availability> {
    let ids = normalize_station_ids(station_ids)?;
    let conflicts = find_conflicts(conn, &ids, date, slot)?;
    Ok(partition(&ids, &conflicts))
}
