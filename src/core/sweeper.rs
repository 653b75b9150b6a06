//! Periodic status sweep: booking status derived from wall-clock time.

use crate::db::log::audit;
use crate::db::queries::{load_sweepable, update_status_if};
use crate::errors::AppResult;
use crate::models::booking::{Booking, BookingStatus};
use crate::ui::messages::warning;
use crate::utils::time::format_datetime;
use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepPolicy {
    /// When set, a confirmed booking needs an explicit check-in; without one
    /// it turns into a no-show once the grace period has elapsed.
    pub require_check_in: bool,
    pub grace_minutes: i64,
}

impl Default for SweepPolicy {
    fn default() -> Self {
        Self {
            require_check_in: false,
            grace_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub transitioned: usize,
    /// Rows changed by someone else between load and update.
    pub skipped: usize,
    pub failed: usize,
}

/// Status `booking` should have at `now`, or `None` if it stays as is.
/// Terminal statuses never change, and intermediate states may be skipped
/// when the sweep runs late.
pub fn derive_status(
    booking: &Booking,
    now: NaiveDateTime,
    policy: &SweepPolicy,
) -> Option<BookingStatus> {
    if booking.status.is_terminal() {
        return None;
    }
    let start = booking.starts_at();
    let end = booking.ends_at();

    let next = match booking.status {
        BookingStatus::Confirmed => {
            if policy.require_check_in && booking.checked_in_at.is_none() {
                (now >= start + Duration::minutes(policy.grace_minutes))
                    .then_some(BookingStatus::NoShow)
            } else if now >= end {
                Some(BookingStatus::Completed)
            } else if now >= start {
                Some(BookingStatus::InProgress)
            } else {
                None
            }
        }
        BookingStatus::InProgress => (now >= end).then_some(BookingStatus::Completed),
        _ => None,
    };

    next.filter(|s| *s != booking.status)
}

fn apply_one(
    conn: &Connection,
    booking: &Booking,
    to: BookingStatus,
    stamp: &str,
) -> AppResult<bool> {
    // compare-and-set: a manual change (cancel, check-in) always wins
    let changed = update_status_if(conn, booking.id, booking.status, to, stamp)?;
    if changed {
        audit(
            conn,
            "sweep",
            &booking.id.to_string(),
            &format!("{} → {} ({} {})", booking.status, to, booking.station_id, booking.slot),
        )?;
    }
    Ok(changed)
}

/// Apply `derive_status` to every non-terminal booking up to `now`'s date.
/// A failing row is reported and skipped; the sweep goes on.
pub fn sweep(conn: &Connection, now: NaiveDateTime, policy: &SweepPolicy) -> AppResult<SweepReport> {
    let candidates = load_sweepable(conn, &now.date())?;
    let stamp = format_datetime(now);
    let mut report = SweepReport {
        examined: candidates.len(),
        ..Default::default()
    };

    for booking in &candidates {
        let Some(to) = derive_status(booking, now, policy) else {
            continue;
        };

        match apply_one(conn, booking, to, &stamp) {
            Ok(true) => report.transitioned += 1,
            Ok(false) => report.skipped += 1,
            Err(e) => {
                report.failed += 1;
                warning(format!("Sweep failed for booking #{}: {}", booking.id, e));
                if let Err(audit_err) =
                    audit(conn, "sweep_error", &booking.id.to_string(), &e.to_string())
                {
                    warning(format!(
                        "Could not record sweep error for booking #{}: {}",
                        booking.id, audit_err
                    ));
                }
            }
        }
    }

    Ok(report)
}
