//! Front desk: the single entry point the CLI talks to.
//!
//! Owns the store connection together with the availability cache and the
//! policies read from the config, so nothing in the crate relies on global
//! state.

use crate::config::{Config, FailurePolicy};
use crate::core::availability::{self, Availability, normalize_station_ids};
use crate::core::booking;
use crate::core::cache::{AvailabilityCache, SlotKey};
use crate::core::sweeper::{self, SweepPolicy, SweepReport};
use crate::db::initialize::init_db;
use crate::db::pool::DbPool;
use crate::errors::{AppResult, ErrorKind};
use crate::models::booking::{Booking, BookingGroupRequest};
use crate::models::time_slot::TimeSlot;
use chrono::{NaiveDate, NaiveDateTime};
use std::time::{Duration, Instant};

/// Availability as shown to the user. `degraded` carries the store error
/// when the answer comes from the failure policy instead of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityView {
    pub availability: Availability,
    pub degraded: Option<String>,
}

pub struct FrontDesk {
    pub pool: DbPool,
    cache: AvailabilityCache,
    on_error: FailurePolicy,
    sweep_policy: SweepPolicy,
}

impl FrontDesk {
    /// Open the configured database, applying pending migrations.
    pub fn open(cfg: &Config) -> AppResult<Self> {
        let pool = DbPool::new(&cfg.database)?;
        init_db(&pool.conn)?;
        Ok(Self::from_pool(pool, cfg))
    }

    pub fn from_pool(pool: DbPool, cfg: &Config) -> Self {
        Self {
            pool,
            cache: AvailabilityCache::new(Duration::from_secs(cfg.availability_cache_ttl_secs)),
            on_error: cfg.availability_on_error,
            sweep_policy: SweepPolicy {
                require_check_in: cfg.require_check_in,
                grace_minutes: cfg.no_show_grace_minutes,
            },
        }
    }

    pub fn cache(&self) -> &AvailabilityCache {
        &self.cache
    }

    /// Cached availability check. Input is validated first; store errors
    /// propagate.
    pub fn check_availability(
        &mut self,
        station_ids: &[String],
        date: NaiveDate,
        slot: TimeSlot,
    ) -> AppResult<Availability> {
        let ids = normalize_station_ids(station_ids)?;

        let version = self.pool.data_version()?;
        self.cache.sync_store_version(version);

        let key = SlotKey::new(date, slot);
        if let Some(hit) = self.cache.lookup(&key, &ids, Instant::now()) {
            return Ok(hit);
        }

        let fresh = availability::check_availability(&self.pool.conn, &ids, &date, &slot)?;
        self.cache.store(key, &fresh, Instant::now());
        Ok(fresh)
    }

    /// Availability for display: a failing store yields the configured
    /// fallback together with the reason, never a silent answer.
    pub fn availability_view(
        &mut self,
        station_ids: &[String],
        date: NaiveDate,
        slot: TimeSlot,
    ) -> AppResult<AvailabilityView> {
        match self.check_availability(station_ids, date, slot) {
            Ok(availability) => Ok(AvailabilityView {
                availability,
                degraded: None,
            }),
            Err(e) if e.kind() == ErrorKind::Transport => {
                let ids = normalize_station_ids(station_ids)?;
                let available = self.on_error == FailurePolicy::Open;
                Ok(AvailabilityView {
                    availability: Availability::uniform(&ids, available),
                    degraded: Some(e.to_string()),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Atomic group submission. The cache for the date is dropped whatever
    /// the outcome: a conflict means what we had cached was already stale.
    pub fn submit_booking_group(
        &mut self,
        req: &BookingGroupRequest,
        now: NaiveDateTime,
    ) -> AppResult<Vec<Booking>> {
        let result = booking::submit_booking_group(&mut self.pool.conn, req, now);
        if !matches!(result, Err(ref e) if e.kind() == ErrorKind::Validation) {
            self.cache.invalidate_date(req.date);
        }
        result
    }

    pub fn cancel_booking(&mut self, id: i64, now: NaiveDateTime) -> AppResult<Booking> {
        let b = booking::cancel_booking(&self.pool.conn, id, now)?;
        self.cache.invalidate_slot(b.date, &b.slot);
        Ok(b)
    }

    pub fn cancel_group(&mut self, group_id: &str, now: NaiveDateTime) -> AppResult<Vec<Booking>> {
        let rows = booking::cancel_group(&mut self.pool.conn, group_id, now)?;
        for b in &rows {
            self.cache.invalidate_slot(b.date, &b.slot);
        }
        Ok(rows)
    }

    pub fn check_in(&mut self, id: i64, now: NaiveDateTime) -> AppResult<Booking> {
        booking::check_in(&self.pool.conn, id, now)
    }

    pub fn delete_group(&mut self, group_id: &str) -> AppResult<usize> {
        let n = booking::delete_group(&self.pool.conn, group_id)?;
        self.cache.clear();
        Ok(n)
    }

    pub fn sweep(&mut self, now: NaiveDateTime) -> AppResult<SweepReport> {
        let report = sweeper::sweep(&self.pool.conn, now, &self.sweep_policy)?;
        if report.transitioned > 0 {
            self.cache.clear();
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{date, group_request, migrate, now};
    use crate::errors::AppError;

    fn desk(stations: &[&str], policy: FailurePolicy) -> FrontDesk {
        let pool = DbPool::in_memory().unwrap();
        migrate(&pool, stations);
        let mut cfg = Config::with_database(":memory:");
        cfg.availability_on_error = policy;
        FrontDesk::from_pool(pool, &cfg)
    }

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn second_check_is_served_from_cache_until_a_booking_lands() {
        let mut d = desk(&["s1", "s2"], FailurePolicy::Closed);
        let slot = TimeSlot::parse("14:00-15:00").unwrap();
        let day = date("2024-01-01");

        let a = d.check_availability(&ids(&["s1", "s2"]), day, slot).unwrap();
        let b = d.check_availability(&ids(&["s1", "s2"]), day, slot).unwrap();
        assert_eq!(a, b);
        assert_eq!(d.cache().hits(), 1);

        let req = group_request("g1", "2024-01-01", "14:30-15:30", &[("s1", 300.0)]);
        d.submit_booking_group(&req, now()).unwrap();
        assert!(d.cache().is_empty());

        let c = d.check_availability(&ids(&["s1", "s2"]), day, slot).unwrap();
        assert_eq!(c.unavailable_ids, ids(&["s1"]));
    }

    #[test]
    fn commits_from_another_connection_bypass_the_cache() {
        let path = std::env::temp_dir().join(format!(
            "rlounge_desk_version_{}.sqlite",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let db_path = path.to_string_lossy().to_string();

        let pool = DbPool::new(&db_path).unwrap();
        migrate(&pool, &["s1"]);
        let mut d = FrontDesk::from_pool(pool, &Config::with_database(db_path.clone()));

        let slot = TimeSlot::parse("14:00-15:00").unwrap();
        let day = date("2024-01-01");
        assert!(d.check_availability(&ids(&["s1"]), day, slot).unwrap().all_available());

        // another desk books the station
        let mut other = DbPool::new(&db_path).unwrap();
        let req = group_request("g1", "2024-01-01", "14:00-15:00", &[("s1", 300.0)]);
        booking::submit_booking_group(&mut other.conn, &req, now()).unwrap();

        let after = d.check_availability(&ids(&["s1"]), day, slot).unwrap();
        assert_eq!(after.unavailable_ids, ids(&["s1"]));

        drop(d);
        drop(other);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn store_failure_degrades_per_policy_and_says_so() {
        for (policy, expect_free) in [(FailurePolicy::Closed, false), (FailurePolicy::Open, true)] {
            let mut d = desk(&["s1"], policy);
            d.pool.conn.execute_batch("DROP TABLE bookings;").unwrap();

            let slot = TimeSlot::parse("14:00-15:00").unwrap();
            let view = d
                .availability_view(&ids(&["s1"]), date("2024-01-01"), slot)
                .unwrap();
            assert!(view.degraded.is_some());
            assert_eq!(view.availability.is_available("s1"), expect_free);
        }
    }

    #[test]
    fn validation_errors_are_not_degraded() {
        let mut d = desk(&["s1"], FailurePolicy::Open);
        let slot = TimeSlot::parse("14:00-15:00").unwrap();
        assert!(matches!(
            d.availability_view(&[], date("2024-01-01"), slot),
            Err(AppError::Validation(_))
        ));
    }
}
