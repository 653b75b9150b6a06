//! Fixtures shared by the core unit tests.

use crate::db::migrate::run_pending_migrations;
use crate::db::pool::DbPool;
use crate::db::queries::insert_station;
use crate::models::booking::{BookingGroupRequest, StationPrice};
use crate::models::station::{Station, StationKind};
use crate::models::time_slot::TimeSlot;
use chrono::{NaiveDate, NaiveDateTime};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

/// A wall-clock instant well before every booking used in tests.
pub fn now() -> NaiveDateTime {
    at("2023-12-31 09:00")
}

pub fn station(id: &str, rate: f64) -> Station {
    Station {
        id: id.to_string(),
        name: format!("Station {}", id),
        kind: StationKind::Console,
        hourly_rate: rate,
        active: true,
        current_session: None,
    }
}

pub fn migrate(pool: &DbPool, ids: &[&str]) {
    run_pending_migrations(&pool.conn).unwrap();
    for id in ids {
        insert_station(&pool.conn, &station(id, 300.0)).unwrap();
    }
}

pub fn memory_db_with_stations(ids: &[&str]) -> DbPool {
    let pool = DbPool::in_memory().unwrap();
    migrate(&pool, ids);
    pool
}

pub fn group_request(
    group: &str,
    day: &str,
    slot: &str,
    stations: &[(&str, f64)],
) -> BookingGroupRequest {
    let slot = TimeSlot::parse(slot).unwrap();
    BookingGroupRequest {
        customer_id: "c1".to_string(),
        date: date(day),
        slot,
        duration_minutes: slot.duration_minutes(),
        booking_group_id: group.to_string(),
        coupon_code: None,
        discount_percentage: 0.0,
        stations: stations
            .iter()
            .map(|(id, price)| StationPrice::new(*id, *price))
            .collect(),
    }
}
