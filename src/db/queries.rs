//! Station and booking queries.

use crate::errors::AppError;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::station::{Station, StationKind};
use crate::models::time_slot::TimeSlot;
use crate::utils::date::format_date;
use crate::utils::time::{format_time, parse_time};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Result, Row, params, params_from_iter};

const BOOKING_COLUMNS: &str = "id, customer_id, station_id, booking_group_id, date, start_time, \
     end_time, duration_minutes, status, coupon_code, discount_percentage, original_price, \
     final_price, checked_in_at, created_at, updated_at";

const STATION_SELECT: &str = "SELECT st.id, st.name, st.kind, st.hourly_rate, st.active, s.id AS open_session
     FROM stations st
     LEFT JOIN sessions s ON s.station_id = st.id AND s.end_time IS NULL";

fn conversion_err(col: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, Type::Text, Box::new(err))
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

// ---------------------------
// Stations
// ---------------------------

pub fn map_station(row: &Row) -> Result<Station> {
    let kind_str: String = row.get("kind")?;
    let kind = StationKind::from_db_str(&kind_str)
        .ok_or_else(|| conversion_err(2, AppError::InvalidStationKind(kind_str.clone())))?;

    Ok(Station {
        id: row.get("id")?,
        name: row.get("name")?,
        kind,
        hourly_rate: row.get("hourly_rate")?,
        active: row.get::<_, i32>("active")? == 1,
        current_session: row.get("open_session")?,
    })
}

pub fn insert_station(conn: &Connection, st: &Station) -> crate::errors::AppResult<()> {
    conn.execute(
        "INSERT INTO stations (id, name, kind, hourly_rate, active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            st.id,
            st.name,
            st.kind.to_db_str(),
            st.hourly_rate,
            if st.active { 1 } else { 0 },
            chrono::Local::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn load_station(conn: &Connection, id: &str) -> Result<Option<Station>> {
    let sql = format!("{STATION_SELECT} WHERE st.id = ?1");
    conn.query_row(&sql, [id], map_station).optional()
}

pub fn load_stations(conn: &Connection, include_retired: bool) -> Result<Vec<Station>> {
    let sql = format!("{STATION_SELECT} WHERE ?1 OR st.active = 1 ORDER BY st.kind, st.id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([include_retired], map_station)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Returns the number of rows touched (0 when the station does not exist).
pub fn update_station_rate(conn: &Connection, id: &str, rate: f64) -> Result<usize> {
    conn.execute(
        "UPDATE stations SET hourly_rate = ?1 WHERE id = ?2",
        params![rate, id],
    )
}

pub fn set_station_active(conn: &Connection, id: &str, active: bool) -> Result<usize> {
    conn.execute(
        "UPDATE stations SET active = ?1 WHERE id = ?2",
        params![if active { 1 } else { 0 }, id],
    )
}

// ---------------------------
// Bookings
// ---------------------------

pub fn map_booking(row: &Row) -> Result<Booking> {
    let date_str: String = row.get("date")?;
    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map_err(|_| conversion_err(4, AppError::InvalidDate(date_str.clone())))?;

    let start = time_column(row, "start_time", 5)?;
    let end = time_column(row, "end_time", 6)?;
    let slot = TimeSlot::new(start, end).map_err(|e| conversion_err(6, e))?;

    let status_str: String = row.get("status")?;
    let status = BookingStatus::from_db_str(&status_str)
        .ok_or_else(|| conversion_err(8, AppError::InvalidStatus(status_str.clone())))?;

    Ok(Booking {
        id: row.get("id")?,
        customer_id: row.get("customer_id")?,
        station_id: row.get("station_id")?,
        booking_group_id: row.get("booking_group_id")?,
        date,
        slot,
        duration_minutes: row.get("duration_minutes")?,
        status,
        coupon_code: row.get("coupon_code")?,
        discount_percentage: row.get("discount_percentage")?,
        original_price: row.get("original_price")?,
        final_price: row.get("final_price")?,
        checked_in_at: row.get("checked_in_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn time_column(row: &Row, name: &str, col: usize) -> Result<NaiveTime> {
    let s: String = row.get(name)?;
    parse_time(&s).ok_or_else(|| conversion_err(col, AppError::InvalidTime(s.clone())))
}

fn collect(stmt: &mut rusqlite::Statement<'_>, args: Vec<String>) -> Result<Vec<Booking>> {
    let rows = stmt.query_map(params_from_iter(args), map_booking)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Insert a booking row and return its id.
pub fn insert_booking(conn: &Connection, b: &Booking) -> Result<i64> {
    conn.execute(
        "INSERT INTO bookings (customer_id, station_id, booking_group_id, date, start_time,
             end_time, duration_minutes, status, coupon_code, discount_percentage,
             original_price, final_price, checked_in_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            b.customer_id,
            b.station_id,
            b.booking_group_id,
            b.date_str(),
            b.slot.start_str(),
            b.slot.end_str(),
            b.duration_minutes,
            b.status.to_db_str(),
            b.coupon_code,
            b.discount_percentage,
            b.original_price,
            b.final_price,
            b.checked_in_at,
            b.created_at,
            b.updated_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn load_booking(conn: &Connection, id: i64) -> Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1");
    conn.query_row(&sql, [id], map_booking).optional()
}

pub fn load_group(conn: &Connection, group_id: &str) -> Result<Vec<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_group_id = ?1 ORDER BY id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    collect(&mut stmt, vec![group_id.to_string()])
}

pub fn load_bookings_by_date(
    conn: &Connection,
    date: &NaiveDate,
    status: Option<BookingStatus>,
) -> Result<Vec<Booking>> {
    let mut sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE date = ?");
    let mut args = vec![format_date(*date)];
    if let Some(s) = status {
        sql.push_str(" AND status = ?");
        args.push(s.to_db_str().to_string());
    }
    sql.push_str(" ORDER BY start_time ASC, station_id ASC");

    let mut stmt = conn.prepare(&sql)?;
    collect(&mut stmt, args)
}

/// Active bookings on `date` for any of `station_ids` overlapping `slot`.
///
/// Single strict half-open predicate: `b.start < slot.end AND b.end > slot.start`.
pub fn find_conflicts(
    conn: &Connection,
    station_ids: &[String],
    date: &NaiveDate,
    slot: &TimeSlot,
) -> Result<Vec<Booking>> {
    if station_ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE date = ?
           AND status IN ('confirmed','in-progress')
           AND start_time < ?
           AND end_time > ?
           AND station_id IN ({})
         ORDER BY station_id, start_time",
        placeholders(station_ids.len())
    );

    let mut args = vec![format_date(*date), slot.end_str(), slot.start_str()];
    args.extend(station_ids.iter().cloned());

    let mut stmt = conn.prepare(&sql)?;
    collect(&mut stmt, args)
}

/// Active booking on `station_id` covering the instant `date` + `time`, if any.
pub fn active_booking_at(
    conn: &Connection,
    station_id: &str,
    date: &NaiveDate,
    time: NaiveTime,
) -> Result<Option<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE station_id = ?1 AND date = ?2
           AND status IN ('confirmed','in-progress')
           AND start_time <= ?3 AND end_time > ?3
         LIMIT 1"
    );
    conn.query_row(
        &sql,
        params![station_id, format_date(*date), format_time(time)],
        map_booking,
    )
    .optional()
}

/// Non-terminal bookings dated up to and including `until`.
pub fn load_sweepable(conn: &Connection, until: &NaiveDate) -> Result<Vec<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE status IN ('confirmed','in-progress') AND date <= ?
         ORDER BY date ASC, start_time ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    collect(&mut stmt, vec![format_date(*until)])
}

/// Compare-and-set status update. Returns `false` when the row no longer
/// has status `from` (someone else changed it first).
pub fn update_status_if(
    conn: &Connection,
    id: i64,
    from: BookingStatus,
    to: BookingStatus,
    updated_at: &str,
) -> Result<bool> {
    let n = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
        params![to.to_db_str(), updated_at, id, from.to_db_str()],
    )?;
    Ok(n == 1)
}

pub fn mark_checked_in(conn: &Connection, id: i64, at: &str) -> Result<bool> {
    let n = conn.execute(
        "UPDATE bookings SET status = 'in-progress', checked_in_at = ?1, updated_at = ?1
         WHERE id = ?2 AND status = 'confirmed'",
        params![at, id],
    )?;
    Ok(n == 1)
}

pub fn delete_group(conn: &Connection, group_id: &str) -> Result<usize> {
    conn.execute(
        "DELETE FROM bookings WHERE booking_group_id = ?1",
        [group_id],
    )
}
