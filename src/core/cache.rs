//! Short-lived availability cache.
//!
//! Advisory only: the booking write path always re-checks inside its own
//! transaction. Each station's answer expires on its own after the TTL;
//! entries are dropped for a date on any local booking write, and all of them
//! when the store reports a commit from another connection.

use crate::core::availability::Availability;
use crate::models::time_slot::TimeSlot;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub date: NaiveDate,
    pub slot: TimeSlot,
}

impl SlotKey {
    pub fn new(date: NaiveDate, slot: TimeSlot) -> Self {
        Self { date, slot }
    }
}

/// station id → (available, read at)
type Entry = HashMap<String, (bool, Instant)>;

#[derive(Debug)]
pub struct AvailabilityCache {
    ttl: Duration,
    entries: HashMap<SlotKey, Entry>,
    store_version: Option<i64>,
    hits: u64,
    misses: u64,
}

impl AvailabilityCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
            store_version: None,
            hits: 0,
            misses: 0,
        }
    }

    /// Answer from cache only if every requested station is known and fresh.
    pub fn lookup(
        &mut self,
        key: &SlotKey,
        station_ids: &[String],
        now: Instant,
    ) -> Option<Availability> {
        let ttl = self.ttl;
        if let Some(entry) = self.entries.get_mut(key) {
            entry.retain(|_, (_, read_at)| now.saturating_duration_since(*read_at) < ttl);
            if entry.is_empty() {
                self.entries.remove(key);
            }
        }

        let mut out = Availability::default();
        let Some(entry) = self.entries.get(key) else {
            self.misses += 1;
            return None;
        };
        for id in station_ids {
            match entry.get(id) {
                Some((true, _)) => out.available_ids.push(id.clone()),
                Some((false, _)) => out.unavailable_ids.push(id.clone()),
                None => {
                    self.misses += 1;
                    return None;
                }
            }
        }

        self.hits += 1;
        Some(out)
    }

    /// Record a fresh answer. Only the stations in `result` get a new read
    /// time; others cached for the key keep their own.
    pub fn store(&mut self, key: SlotKey, result: &Availability, now: Instant) {
        let entry = self.entries.entry(key).or_default();

        for id in &result.available_ids {
            entry.insert(id.clone(), (true, now));
        }
        for id in &result.unavailable_ids {
            entry.insert(id.clone(), (false, now));
        }
    }

    /// Drop every entry whose slot overlaps `slot` on `date`.
    pub fn invalidate_slot(&mut self, date: NaiveDate, slot: &TimeSlot) {
        self.entries
            .retain(|k, _| !(k.date == date && k.slot.overlaps(slot)));
    }

    pub fn invalidate_date(&mut self, date: NaiveDate) {
        self.entries.retain(|k, _| k.date != date);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Compare the store's change counter with the one seen last time; any
    /// difference means another writer committed, so everything is dropped.
    pub fn sync_store_version(&mut self, version: i64) {
        if self.store_version != Some(version) {
            self.entries.clear();
            self.store_version = Some(version);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::date;

    fn key(slot: &str) -> SlotKey {
        SlotKey::new(date("2024-01-01"), TimeSlot::parse(slot).unwrap())
    }

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn answer(free: &[&str], busy: &[&str]) -> Availability {
        Availability {
            available_ids: ids(free),
            unavailable_ids: ids(busy),
        }
    }

    #[test]
    fn hit_within_ttl_miss_after() {
        let mut cache = AvailabilityCache::new(Duration::from_secs(120));
        let t0 = Instant::now();
        let k = key("14:00-15:00");
        cache.store(k, &answer(&["s1"], &["s2"]), t0);

        let got = cache
            .lookup(&k, &ids(&["s2", "s1"]), t0 + Duration::from_secs(60))
            .unwrap();
        assert_eq!(got, answer(&["s1"], &["s2"]));

        assert!(
            cache
                .lookup(&k, &ids(&["s1"]), t0 + Duration::from_secs(120))
                .is_none()
        );
        assert!(cache.is_empty());
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn each_station_expires_on_its_own_clock() {
        let mut cache = AvailabilityCache::new(Duration::from_secs(120));
        let t0 = Instant::now();
        let k = key("14:00-15:00");
        cache.store(k, &answer(&["s1"], &[]), t0);
        cache.store(k, &answer(&["s2"], &[]), t0 + Duration::from_secs(100));

        let later = t0 + Duration::from_secs(200);
        assert!(cache.lookup(&k, &ids(&["s1"]), later).is_none());
        assert_eq!(
            cache.lookup(&k, &ids(&["s2"]), later),
            Some(answer(&["s2"], &[]))
        );
    }

    #[test]
    fn unknown_station_is_a_miss() {
        let mut cache = AvailabilityCache::new(Duration::from_secs(120));
        let t0 = Instant::now();
        let k = key("14:00-15:00");
        cache.store(k, &answer(&["s1"], &[]), t0);
        assert!(cache.lookup(&k, &ids(&["s1", "s3"]), t0).is_none());
    }

    #[test]
    fn overlapping_slots_are_invalidated() {
        let mut cache = AvailabilityCache::new(Duration::from_secs(120));
        let t0 = Instant::now();
        cache.store(key("14:00-15:00"), &answer(&["s1"], &[]), t0);
        cache.store(key("15:00-16:00"), &answer(&["s1"], &[]), t0);
        cache.store(key("18:00-19:00"), &answer(&["s1"], &[]), t0);

        cache.invalidate_slot(date("2024-01-01"), &TimeSlot::parse("14:30-15:30").unwrap());
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup(&key("18:00-19:00"), &ids(&["s1"]), t0).is_some());
    }

    #[test]
    fn foreign_commit_clears_everything() {
        let mut cache = AvailabilityCache::new(Duration::from_secs(120));
        let t0 = Instant::now();
        cache.sync_store_version(1);
        cache.store(key("14:00-15:00"), &answer(&["s1"], &[]), t0);

        cache.sync_store_version(1);
        assert_eq!(cache.len(), 1);
        cache.sync_store_version(2);
        assert!(cache.is_empty());
    }
}
