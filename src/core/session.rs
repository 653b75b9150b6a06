//! Walk-in sessions: start, live clock and stop-to-cart.

use crate::db::log::audit;
use crate::db::queries::{active_booking_at, load_station};
use crate::db::sessions::{
    close_session, insert_cart_item, insert_session, load_open_session_for_station, load_session,
};
use crate::errors::{AppError, AppResult};
use crate::models::booking::Booking;
use crate::models::session::{CartItem, Session};
use crate::utils::formatting::mins2readable;
use chrono::NaiveDateTime;
use rusqlite::{Connection, TransactionBehavior};

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Snapshot of a running session for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTick {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub elapsed_ms: i64,
    /// Whole currency units, always rounded up.
    pub cost: i64,
}

/// Pure clock: everything derives from start time, rate and `now`,
/// so it can be sampled at any cadence without drift.
pub struct SessionClock;

impl SessionClock {
    pub fn sample(start: NaiveDateTime, hourly_rate: f64, now: NaiveDateTime) -> SessionTick {
        let elapsed_ms = (now - start).num_milliseconds().max(0);
        let total_secs = elapsed_ms / 1000;

        SessionTick {
            hours: total_secs / 3600,
            minutes: (total_secs % 3600) / 60,
            seconds: total_secs % 60,
            elapsed_ms,
            cost: Self::cost(elapsed_ms, hourly_rate),
        }
    }

    /// `ceil(elapsed_ms / 3_600_000 × rate)`; multiplying first keeps integer
    /// rates exact.
    pub fn cost(elapsed_ms: i64, hourly_rate: f64) -> i64 {
        if elapsed_ms <= 0 || hourly_rate <= 0.0 {
            return 0;
        }
        ((elapsed_ms as f64 * hourly_rate) / MS_PER_HOUR).ceil() as i64
    }
}

impl std::fmt::Display for SessionTick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Result of starting a session: the new row plus any booking that already
/// holds the station right now (reported, not enforced).
#[derive(Debug)]
pub struct Started {
    pub session: Session,
    pub clashing_booking: Option<Booking>,
}

pub fn start_session(
    conn: &mut Connection,
    station_id: &str,
    customer_id: Option<&str>,
    now: NaiveDateTime,
) -> AppResult<Started> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let station =
        load_station(&tx, station_id)?.ok_or_else(|| AppError::UnknownStation(station_id.into()))?;
    if !station.active {
        return Err(AppError::StationRetired(station.id));
    }
    if let Some(open) = load_open_session_for_station(&tx, station_id)? {
        return Err(AppError::StationOccupied {
            station: station_id.to_string(),
            session_id: open.id,
        });
    }

    let clashing_booking = active_booking_at(&tx, station_id, &now.date(), now.time())?;
    let id = insert_session(&tx, station_id, customer_id, station.hourly_rate, now)?;

    audit(
        &tx,
        "session_start",
        station_id,
        &format!("session #{} for {}", id, customer_id.unwrap_or("walk-in")),
    )?;
    tx.commit()?;

    Ok(Started {
        session: Session {
            id,
            station_id: station_id.to_string(),
            customer_id: customer_id.map(str::to_string),
            hourly_rate: station.hourly_rate,
            start_time: now,
            end_time: None,
            duration_minutes: None,
            cost: None,
        },
        clashing_booking,
    })
}

/// Close a session and turn it into a cart line, in one transaction.
pub fn stop_session(
    conn: &mut Connection,
    session_id: i64,
    now: NaiveDateTime,
) -> AppResult<(Session, CartItem)> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut session =
        load_session(&tx, session_id)?.ok_or(AppError::SessionNotFound(session_id))?;
    if !session.is_open() {
        return Err(AppError::SessionClosed(session_id));
    }

    let station = load_station(&tx, &session.station_id)?
        .ok_or_else(|| AppError::UnknownStation(session.station_id.clone()))?;

    let end = now.max(session.start_time);
    let tick = SessionClock::sample(session.start_time, session.hourly_rate, end);
    let minutes = tick.elapsed_ms / 60_000;

    if !close_session(&tx, session_id, end, minutes, tick.cost)? {
        return Err(AppError::SessionClosed(session_id));
    }

    let label = format!(
        "{} session ({})",
        station.name,
        mins2readable(minutes, false)
    );
    let item = insert_cart_item(&tx, &label, "session", session_id, tick.cost as f64)?;

    audit(
        &tx,
        "session_stop",
        &session.station_id,
        &format!("session #{} closed after {}, cost {}", session_id, tick, tick.cost),
    )?;
    tx.commit()?;

    session.end_time = Some(end);
    session.duration_minutes = Some(minutes);
    session.cost = Some(tick.cost);
    Ok((session, item))
}

/// Live clock for an open session.
pub fn sample_open_session(
    conn: &Connection,
    session_id: i64,
    now: NaiveDateTime,
) -> AppResult<(Session, SessionTick)> {
    let session = load_session(conn, session_id)?.ok_or(AppError::SessionNotFound(session_id))?;
    if !session.is_open() {
        return Err(AppError::SessionClosed(session_id));
    }

    let tick = SessionClock::sample(session.start_time, session.hourly_rate, now);
    Ok((session, tick))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::booking::submit_booking_group;
    use crate::core::test_support::{at, group_request, memory_db_with_stations, now};
    use crate::db::queries::update_station_rate;
    use crate::db::sessions::load_cart;
    use chrono::Duration;

    #[test]
    fn cost_rounds_up_to_the_next_unit() {
        // 300/h for one minute is 5 exactly; one second more is 5.08 → 6
        assert_eq!(SessionClock::cost(60_000, 300.0), 5);
        assert_eq!(SessionClock::cost(61_000, 300.0), 6);
        assert_eq!(SessionClock::cost(3_600_000, 300.0), 300);
        assert_eq!(SessionClock::cost(1, 300.0), 1);
        assert_eq!(SessionClock::cost(0, 300.0), 0);
    }

    #[test]
    fn clock_splits_elapsed_time() {
        let start = at("2024-01-01 14:00");
        let t = SessionClock::sample(start, 120.0, start + Duration::seconds(3725));
        assert_eq!((t.hours, t.minutes, t.seconds), (1, 2, 5));
        assert_eq!(t.to_string(), "01:02:05");
        // 3725 s at 120/h = 124.17 → 125
        assert_eq!(t.cost, 125);
    }

    #[test]
    fn clock_before_start_is_zero() {
        let start = at("2024-01-01 14:00");
        let t = SessionClock::sample(start, 120.0, start - Duration::seconds(30));
        assert_eq!(t.elapsed_ms, 0);
        assert_eq!(t.cost, 0);
    }

    #[test]
    fn cost_never_decreases() {
        let start = at("2024-01-01 14:00");
        for rate in [0.0, 1.0, 99.99, 150.0, 333.33] {
            let mut last = 0;
            for s in (0..7200).step_by(7) {
                let c = SessionClock::sample(start, rate, start + Duration::seconds(s)).cost;
                assert!(c >= last, "rate {rate}: cost went from {last} to {c} at {s}s");
                last = c;
            }
        }
    }

    #[test]
    fn one_open_session_per_station() {
        let mut pool = memory_db_with_stations(&["s1"]);
        let started = start_session(&mut pool.conn, "s1", Some("c1"), now()).unwrap();
        assert!(started.clashing_booking.is_none());

        match start_session(&mut pool.conn, "s1", None, now()) {
            Err(AppError::StationOccupied { session_id, .. }) => {
                assert_eq!(session_id, started.session.id)
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            start_session(&mut pool.conn, "zz", None, now()),
            Err(AppError::UnknownStation(_))
        ));
    }

    #[test]
    fn stop_bills_the_session_into_the_cart() {
        let mut pool = memory_db_with_stations(&["s1"]);
        let start = at("2024-01-01 14:00");
        let s = start_session(&mut pool.conn, "s1", None, start).unwrap().session;

        let (closed, item) =
            stop_session(&mut pool.conn, s.id, start + Duration::minutes(90)).unwrap();
        assert_eq!(closed.duration_minutes, Some(90));
        assert_eq!(closed.cost, Some(450));
        assert_eq!(item.amount, 450.0);
        assert_eq!(item.reference_id, s.id);
        assert_eq!(load_cart(&pool.conn).unwrap().len(), 1);

        assert!(matches!(
            stop_session(&mut pool.conn, s.id, start + Duration::minutes(95)),
            Err(AppError::SessionClosed(_))
        ));
        // the station is free again
        assert!(start_session(&mut pool.conn, "s1", None, start + Duration::minutes(95)).is_ok());
    }

    #[test]
    fn rate_change_mid_session_does_not_reprice_played_time() {
        let mut pool = memory_db_with_stations(&["s1"]);
        let start = at("2024-01-01 14:00");
        let s = start_session(&mut pool.conn, "s1", None, start).unwrap().session;
        assert_eq!(s.hourly_rate, 300.0);

        let (_, t1) = sample_open_session(&pool.conn, s.id, start + Duration::minutes(60)).unwrap();
        update_station_rate(&pool.conn, "s1", 100.0).unwrap();
        let (_, t2) = sample_open_session(&pool.conn, s.id, start + Duration::minutes(61)).unwrap();
        assert_eq!(t1.cost, 300);
        assert!(t2.cost >= t1.cost);
        assert_eq!(t2.cost, 305);

        let (closed, item) =
            stop_session(&mut pool.conn, s.id, start + Duration::minutes(62)).unwrap();
        assert_eq!(closed.cost, Some(310));
        assert_eq!(item.amount, 310.0);

        // the next session picks up the new rate
        let next = start_session(&mut pool.conn, "s1", None, start + Duration::minutes(70))
            .unwrap()
            .session;
        assert_eq!(next.hourly_rate, 100.0);
    }

    #[test]
    fn start_reports_a_booking_holding_the_station() {
        let mut pool = memory_db_with_stations(&["s1"]);
        let req = group_request("g1", "2024-01-01", "14:00-15:00", &[("s1", 300.0)]);
        submit_booking_group(&mut pool.conn, &req, now()).unwrap();

        let started = start_session(&mut pool.conn, "s1", None, at("2024-01-01 14:20")).unwrap();
        assert_eq!(
            started.clashing_booking.map(|b| b.booking_group_id),
            Some("g1".to_string())
        );
    }
}
