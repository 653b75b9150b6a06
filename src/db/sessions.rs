//! Walk-in session and cart queries.

use crate::errors::AppError;
use crate::models::session::{CartItem, Session};
use crate::utils::time::{format_datetime, parse_datetime};
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Result, Row, params};

const SESSION_COLUMNS: &str =
    "id, station_id, customer_id, hourly_rate, start_time, end_time, duration_minutes, cost";

fn datetime_column(row: &Row, name: &str, col: usize) -> Result<Option<NaiveDateTime>> {
    let raw: Option<String> = row.get(name)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_datetime(&s).map(Some).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                col,
                Type::Text,
                Box::new(AppError::InvalidTime(s.clone())),
            )
        }),
    }
}

pub fn map_session(row: &Row) -> Result<Session> {
    let start_time = datetime_column(row, "start_time", 4)?.ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Null,
            Box::new(AppError::InvalidTime("missing session start".into())),
        )
    })?;

    Ok(Session {
        id: row.get("id")?,
        station_id: row.get("station_id")?,
        customer_id: row.get("customer_id")?,
        hourly_rate: row.get("hourly_rate")?,
        start_time,
        end_time: datetime_column(row, "end_time", 5)?,
        duration_minutes: row.get("duration_minutes")?,
        cost: row.get("cost")?,
    })
}

pub fn insert_session(
    conn: &Connection,
    station_id: &str,
    customer_id: Option<&str>,
    hourly_rate: f64,
    start: NaiveDateTime,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO sessions (station_id, customer_id, hourly_rate, start_time)
         VALUES (?1, ?2, ?3, ?4)",
        params![station_id, customer_id, hourly_rate, format_datetime(start)],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn load_session(conn: &Connection, id: i64) -> Result<Option<Session>> {
    let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1");
    conn.query_row(&sql, [id], map_session).optional()
}

pub fn load_open_session_for_station(conn: &Connection, station_id: &str) -> Result<Option<Session>> {
    let sql =
        format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE station_id = ?1 AND end_time IS NULL");
    conn.query_row(&sql, [station_id], map_session).optional()
}

pub fn load_open_sessions(conn: &Connection) -> Result<Vec<Session>> {
    let sql = format!(
        "SELECT {SESSION_COLUMNS} FROM sessions WHERE end_time IS NULL ORDER BY start_time ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], map_session)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Close an open session. Returns `false` if it was already closed.
pub fn close_session(
    conn: &Connection,
    id: i64,
    end: NaiveDateTime,
    duration_minutes: i64,
    cost: i64,
) -> Result<bool> {
    let n = conn.execute(
        "UPDATE sessions SET end_time = ?1, duration_minutes = ?2, cost = ?3
         WHERE id = ?4 AND end_time IS NULL",
        params![format_datetime(end), duration_minutes, cost, id],
    )?;
    Ok(n == 1)
}

pub fn insert_cart_item(
    conn: &Connection,
    label: &str,
    source: &str,
    reference_id: i64,
    amount: f64,
) -> Result<CartItem> {
    let created_at = chrono::Local::now().to_rfc3339();
    conn.execute(
        "INSERT INTO cart_items (label, source, reference_id, amount, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![label, source, reference_id, amount, created_at],
    )?;

    Ok(CartItem {
        id: conn.last_insert_rowid(),
        label: label.to_string(),
        source: source.to_string(),
        reference_id,
        amount,
        created_at,
    })
}

pub fn load_cart(conn: &Connection) -> Result<Vec<CartItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, label, source, reference_id, amount, created_at
         FROM cart_items ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(CartItem {
            id: row.get(0)?,
            label: row.get(1)?,
            source: row.get(2)?,
            reference_id: row.get(3)?,
            amount: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
