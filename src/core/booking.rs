//! Booking groups: atomic multi-station reservations, cancellation,
//! check-in and admin deletion.

use crate::core::availability::partition;
use crate::core::pricing::{final_price, validate_discount, validate_price};
use crate::db::log::audit;
use crate::db::queries::{
    self, find_conflicts, insert_booking, load_booking, load_group, load_station,
    update_status_if,
};
use crate::errors::{AppError, AppResult};
use crate::models::booking::{Booking, BookingGroupRequest, BookingStatus};
use crate::utils::time::format_datetime;
use chrono::NaiveDateTime;
use rusqlite::{Connection, TransactionBehavior};
use std::collections::HashSet;

/// Input checks that need no store access.
pub fn validate_request(req: &BookingGroupRequest) -> AppResult<()> {
    if req.customer_id.trim().is_empty() {
        return Err(AppError::Validation("customer id must not be empty".into()));
    }
    if req.booking_group_id.trim().is_empty() {
        return Err(AppError::Validation(
            "booking group id must not be empty".into(),
        ));
    }
    if req.stations.is_empty() {
        return Err(AppError::Validation(
            "a booking needs at least one station".into(),
        ));
    }

    let mut seen = HashSet::new();
    for s in &req.stations {
        if s.station_id.trim().is_empty() {
            return Err(AppError::Validation("station id must not be empty".into()));
        }
        if !seen.insert(s.station_id.as_str()) {
            return Err(AppError::Validation(format!(
                "station {} listed more than once",
                s.station_id
            )));
        }
        validate_price(&s.station_id, s.price)?;
    }

    if req.duration_minutes != req.slot.duration_minutes() {
        return Err(AppError::Validation(format!(
            "duration of {} min does not match slot {} ({} min)",
            req.duration_minutes,
            req.slot,
            req.slot.duration_minutes()
        )));
    }

    validate_discount(req.discount_percentage)?;
    Ok(())
}

/// A stored group matches a resubmission when it covers the same
/// customer, date, slot and station set.
fn is_same_group(existing: &[Booking], req: &BookingGroupRequest) -> bool {
    let stored: HashSet<&str> = existing.iter().map(|b| b.station_id.as_str()).collect();
    let requested: HashSet<&str> = req.stations.iter().map(|s| s.station_id.as_str()).collect();

    stored == requested
        && existing.iter().all(|b| {
            b.customer_id == req.customer_id && b.date == req.date && b.slot == req.slot
        })
}

/// Re-validate availability and insert one row per station, atomically.
///
/// The whole operation runs in a single `BEGIN IMMEDIATE` transaction, so no
/// other writer can slip a booking between the conflict check and the
/// inserts. On any error nothing is written.
pub fn submit_booking_group(
    conn: &mut Connection,
    req: &BookingGroupRequest,
    now: NaiveDateTime,
) -> AppResult<Vec<Booking>> {
    validate_request(req)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    // Idempotent replay
    let existing = load_group(&tx, &req.booking_group_id)?;
    if !existing.is_empty() {
        if is_same_group(&existing, req) {
            return Ok(existing);
        }
        return Err(AppError::DuplicateGroup(req.booking_group_id.clone()));
    }

    for s in &req.stations {
        match load_station(&tx, &s.station_id)? {
            None => return Err(AppError::UnknownStation(s.station_id.clone())),
            Some(st) if !st.active => return Err(AppError::StationRetired(st.id)),
            Some(_) => {}
        }
    }

    let ids = req.station_ids();
    let conflicts = find_conflicts(&tx, &ids, &req.date, &req.slot)?;
    if !conflicts.is_empty() {
        let verdict = partition(&ids, &conflicts);
        return Err(AppError::Conflict {
            stations: verdict.unavailable_ids,
        });
    }

    let stamp = format_datetime(now);
    let mut created = Vec::with_capacity(req.stations.len());

    for s in &req.stations {
        let mut booking = Booking {
            id: 0,
            customer_id: req.customer_id.clone(),
            station_id: s.station_id.clone(),
            booking_group_id: req.booking_group_id.clone(),
            date: req.date,
            slot: req.slot,
            duration_minutes: req.duration_minutes,
            status: BookingStatus::Confirmed,
            coupon_code: req.coupon_code.clone(),
            discount_percentage: req.discount_percentage,
            original_price: s.price,
            final_price: final_price(s.price, req.discount_percentage),
            checked_in_at: None,
            created_at: stamp.clone(),
            updated_at: stamp.clone(),
        };
        booking.id = insert_booking(&tx, &booking)?;
        created.push(booking);
    }

    audit(
        &tx,
        "book",
        &req.booking_group_id,
        &format!(
            "{} {} for {}: {}",
            req.date,
            req.slot,
            req.customer_id,
            ids.join(", ")
        ),
    )?;

    tx.commit()?;
    Ok(created)
}

/// Cancel one booking. Only confirmed or in-progress bookings can be cancelled.
pub fn cancel_booking(conn: &Connection, id: i64, now: NaiveDateTime) -> AppResult<Booking> {
    let mut booking = load_booking(conn, id)?.ok_or(AppError::BookingNotFound(id))?;

    if !booking.status.is_active() {
        return Err(AppError::BookingLocked {
            id,
            status: booking.status.to_string(),
        });
    }

    let stamp = format_datetime(now);
    if !update_status_if(conn, id, booking.status, BookingStatus::Cancelled, &stamp)? {
        // changed under our feet (sweeper or another desk)
        let current = load_booking(conn, id)?.ok_or(AppError::BookingNotFound(id))?;
        return Err(AppError::BookingLocked {
            id,
            status: current.status.to_string(),
        });
    }

    audit(conn, "cancel", &id.to_string(), &format!("{} {} on {}", booking.station_id, booking.slot, booking.date))?;

    booking.status = BookingStatus::Cancelled;
    booking.updated_at = stamp;
    Ok(booking)
}

/// Cancel every still-active booking of a group. Returns the cancelled rows.
pub fn cancel_group(
    conn: &mut Connection,
    group_id: &str,
    now: NaiveDateTime,
) -> AppResult<Vec<Booking>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let rows = load_group(&tx, group_id)?;
    if rows.is_empty() {
        return Err(AppError::GroupNotFound(group_id.to_string()));
    }

    let stamp = format_datetime(now);
    let mut cancelled = Vec::new();
    for mut b in rows.into_iter().filter(|b| b.status.is_active()) {
        if update_status_if(&tx, b.id, b.status, BookingStatus::Cancelled, &stamp)? {
            b.status = BookingStatus::Cancelled;
            b.updated_at = stamp.clone();
            cancelled.push(b);
        }
    }

    if !cancelled.is_empty() {
        audit(
            &tx,
            "cancel",
            group_id,
            &format!("{} booking(s) cancelled", cancelled.len()),
        )?;
    }

    tx.commit()?;
    Ok(cancelled)
}

/// Record the customer's arrival: confirmed → in-progress.
/// Allowed on the booking's day, before its end.
pub fn check_in(conn: &Connection, id: i64, now: NaiveDateTime) -> AppResult<Booking> {
    let mut booking = load_booking(conn, id)?.ok_or(AppError::BookingNotFound(id))?;

    if booking.status != BookingStatus::Confirmed {
        return Err(AppError::BookingLocked {
            id,
            status: booking.status.to_string(),
        });
    }
    if now.date() != booking.date || now >= booking.ends_at() {
        return Err(AppError::Validation(format!(
            "booking #{} can only be checked in on {} before {}",
            id,
            booking.date,
            booking.slot.end_str()
        )));
    }

    let stamp = format_datetime(now);
    if !queries::mark_checked_in(conn, id, &stamp)? {
        let current = load_booking(conn, id)?.ok_or(AppError::BookingNotFound(id))?;
        return Err(AppError::BookingLocked {
            id,
            status: current.status.to_string(),
        });
    }

    audit(conn, "check_in", &id.to_string(), &format!("{} {}", booking.station_id, booking.slot))?;

    booking.status = BookingStatus::InProgress;
    booking.checked_in_at = Some(stamp.clone());
    booking.updated_at = stamp;
    Ok(booking)
}

/// Admin action: physically remove every row of a group.
pub fn delete_group(conn: &Connection, group_id: &str) -> AppResult<usize> {
    let n = queries::delete_group(conn, group_id)?;
    if n == 0 {
        return Err(AppError::GroupNotFound(group_id.to_string()));
    }
    audit(conn, "delete", group_id, &format!("{} booking row(s) deleted", n))?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{
        at, date, group_request, memory_db_with_stations, migrate, now,
    };
    use crate::db::pool::DbPool;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn single_station_booking_is_created_confirmed() {
        let mut pool = memory_db_with_stations(&["s1"]);
        let req = group_request("g1", "2024-01-01", "14:00-15:00", &[("s1", 300.0)]);

        let rows = submit_booking_group(&mut pool.conn, &req, now()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].final_price, 300.0);
        assert_eq!(rows[0].status, BookingStatus::Confirmed);

        let stored = load_group(&pool.conn, "g1").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, rows[0].id);
        assert_eq!(stored[0].slot.to_string(), "14:00-15:00");
    }

    #[test]
    fn discount_applies_to_every_row() {
        let mut pool = memory_db_with_stations(&["s1", "s2"]);
        let mut req = group_request(
            "g1",
            "2024-01-01",
            "14:00-15:00",
            &[("s1", 300.0), ("s2", 200.0)],
        );
        req.discount_percentage = 50.0;
        req.coupon_code = Some("HALF".into());

        let rows = submit_booking_group(&mut pool.conn, &req, now()).unwrap();
        assert_eq!(rows[0].final_price, 150.0);
        assert_eq!(rows[1].final_price, 100.0);
        assert!(rows.iter().all(|b| b.booking_group_id == "g1"));
        assert!(rows.iter().all(|b| b.coupon_code.as_deref() == Some("HALF")));
    }

    #[test]
    fn conflict_aborts_the_whole_group() {
        let mut pool = memory_db_with_stations(&["s1", "s2", "s3"]);
        let first = group_request("g1", "2024-01-01", "14:00-15:00", &[("s2", 300.0)]);
        submit_booking_group(&mut pool.conn, &first, now()).unwrap();

        let second = group_request(
            "g2",
            "2024-01-01",
            "14:30-15:30",
            &[("s1", 300.0), ("s2", 300.0), ("s3", 300.0)],
        );
        let err = submit_booking_group(&mut pool.conn, &second, now()).unwrap_err();
        match err {
            AppError::Conflict { stations } => assert_eq!(stations, vec!["s2".to_string()]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(load_group(&pool.conn, "g2").unwrap().is_empty());
    }

    #[test]
    fn resubmitting_the_same_group_is_idempotent() {
        let mut pool = memory_db_with_stations(&["s1", "s2"]);
        let req = group_request(
            "g1",
            "2024-01-01",
            "14:00-15:00",
            &[("s1", 300.0), ("s2", 300.0)],
        );

        let a = submit_booking_group(&mut pool.conn, &req, now()).unwrap();
        let b = submit_booking_group(&mut pool.conn, &req, now()).unwrap();
        assert_eq!(
            a.iter().map(|r| r.id).collect::<Vec<_>>(),
            b.iter().map(|r| r.id).collect::<Vec<_>>()
        );
        assert_eq!(load_group(&pool.conn, "g1").unwrap().len(), 2);
    }

    #[test]
    fn reusing_a_group_id_for_another_slot_is_rejected() {
        let mut pool = memory_db_with_stations(&["s1"]);
        let req = group_request("g1", "2024-01-01", "14:00-15:00", &[("s1", 300.0)]);
        submit_booking_group(&mut pool.conn, &req, now()).unwrap();

        let other = group_request("g1", "2024-01-01", "16:00-17:00", &[("s1", 300.0)]);
        assert!(matches!(
            submit_booking_group(&mut pool.conn, &other, now()),
            Err(AppError::DuplicateGroup(_))
        ));
    }

    #[test]
    fn malformed_requests_fail_before_touching_the_store() {
        let mut pool = memory_db_with_stations(&["s1"]);

        let empty = group_request("g1", "2024-01-01", "14:00-15:00", &[]);
        assert!(matches!(
            submit_booking_group(&mut pool.conn, &empty, now()),
            Err(AppError::Validation(_))
        ));

        let dup = group_request(
            "g1",
            "2024-01-01",
            "14:00-15:00",
            &[("s1", 300.0), ("s1", 300.0)],
        );
        assert!(matches!(
            submit_booking_group(&mut pool.conn, &dup, now()),
            Err(AppError::Validation(_))
        ));

        let mut wrong_duration = group_request("g1", "2024-01-01", "14:00-15:00", &[("s1", 1.0)]);
        wrong_duration.duration_minutes = 90;
        assert!(matches!(
            submit_booking_group(&mut pool.conn, &wrong_duration, now()),
            Err(AppError::Validation(_))
        ));

        let unknown = group_request("g1", "2024-01-01", "14:00-15:00", &[("nope", 1.0)]);
        assert!(matches!(
            submit_booking_group(&mut pool.conn, &unknown, now()),
            Err(AppError::UnknownStation(_))
        ));
    }

    #[test]
    fn concurrent_submissions_for_one_station_book_it_once() {
        let path = std::env::temp_dir().join(format!(
            "rlounge_concurrent_{}.sqlite",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let db_path = path.to_string_lossy().to_string();
        {
            let pool = DbPool::new(&db_path).unwrap();
            migrate(&pool, &["s1"]);
        }

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = ["ga", "gb"]
            .into_iter()
            .map(|group| {
                let barrier = Arc::clone(&barrier);
                let db_path = db_path.clone();
                thread::spawn(move || {
                    let mut pool = DbPool::new(&db_path).unwrap();
                    let req =
                        group_request(group, "2024-01-01", "14:00-15:00", &[("s1", 300.0)]);
                    barrier.wait();
                    submit_booking_group(&mut pool.conn, &req, now())
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ok = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 1);
        let err = results.into_iter().find_map(|r| r.err()).unwrap();
        match err {
            AppError::Conflict { stations } => assert_eq!(stations, vec!["s1".to_string()]),
            other => panic!("unexpected error: {other}"),
        }

        let pool = DbPool::new(&db_path).unwrap();
        let rows =
            queries::load_bookings_by_date(&pool.conn, &date("2024-01-01"), None).unwrap();
        assert_eq!(rows.len(), 1);
        drop(pool);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn cancelled_booking_frees_the_slot_and_cannot_be_cancelled_twice() {
        let mut pool = memory_db_with_stations(&["s1"]);
        let req = group_request("g1", "2024-01-01", "14:00-15:00", &[("s1", 300.0)]);
        let rows = submit_booking_group(&mut pool.conn, &req, now()).unwrap();

        let c = cancel_booking(&pool.conn, rows[0].id, now()).unwrap();
        assert_eq!(c.status, BookingStatus::Cancelled);
        assert!(matches!(
            cancel_booking(&pool.conn, rows[0].id, now()),
            Err(AppError::BookingLocked { .. })
        ));

        let again = group_request("g2", "2024-01-01", "14:00-15:00", &[("s1", 300.0)]);
        assert!(submit_booking_group(&mut pool.conn, &again, now()).is_ok());
    }

    #[test]
    fn cancel_group_only_touches_active_rows() {
        let mut pool = memory_db_with_stations(&["s1", "s2"]);
        let req = group_request(
            "g1",
            "2024-01-01",
            "14:00-15:00",
            &[("s1", 300.0), ("s2", 300.0)],
        );
        let rows = submit_booking_group(&mut pool.conn, &req, now()).unwrap();
        cancel_booking(&pool.conn, rows[0].id, now()).unwrap();

        let cancelled = cancel_group(&mut pool.conn, "g1", now()).unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].station_id, "s2");
        assert!(matches!(
            cancel_group(&mut pool.conn, "missing", now()),
            Err(AppError::GroupNotFound(_))
        ));
    }

    #[test]
    fn check_in_moves_booking_in_progress_on_its_day() {
        let mut pool = memory_db_with_stations(&["s1"]);
        let req = group_request("g1", "2024-01-01", "14:00-15:00", &[("s1", 300.0)]);
        let rows = submit_booking_group(&mut pool.conn, &req, now()).unwrap();

        assert!(matches!(
            check_in(&pool.conn, rows[0].id, at("2023-12-31 14:10")),
            Err(AppError::Validation(_))
        ));

        let b = check_in(&pool.conn, rows[0].id, at("2024-01-01 13:55")).unwrap();
        assert_eq!(b.status, BookingStatus::InProgress);
        assert!(b.checked_in_at.is_some());
        let stored = load_booking(&pool.conn, rows[0].id).unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::InProgress);
    }

    #[test]
    fn delete_group_removes_all_rows() {
        let mut pool = memory_db_with_stations(&["s1", "s2"]);
        let req = group_request(
            "g1",
            "2024-01-01",
            "14:00-15:00",
            &[("s1", 300.0), ("s2", 300.0)],
        );
        submit_booking_group(&mut pool.conn, &req, now()).unwrap();

        assert_eq!(delete_group(&pool.conn, "g1").unwrap(), 2);
        assert!(load_group(&pool.conn, "g1").unwrap().is_empty());
        assert!(matches!(
            delete_group(&pool.conn, "g1"),
            Err(AppError::GroupNotFound(_))
        ));
    }
}
