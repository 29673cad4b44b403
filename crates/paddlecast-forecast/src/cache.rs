//! In-memory, process-lifetime forecast cache.
//!
//! Owned by whoever constructs it; nothing here is global. Entries are
//! overwritten on every store and only reclaimed by the sweep that runs
//! right after a store.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::coords::Coordinate;
use crate::types::{DataSource, ForecastResult};

/// Default freshness window for cached forecasts
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

/// Coordinate rounded to six decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lat_e6: i64,
    lng_e6: i64,
}

impl From<&Coordinate> for CacheKey {
    fn from(coord: &Coordinate) -> Self {
        let (lat_e6, lng_e6) = coord.scaled_e6();
        Self { lat_e6, lng_e6 }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6},{:.6}",
            self.lat_e6 as f64 / 1e6,
            self.lng_e6 as f64 / 1e6
        )
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub data: ForecastResult,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn source(&self) -> DataSource {
        self.data.metadata.source
    }
}

#[derive(Debug)]
pub struct ForecastCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl Default for ForecastCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ForecastCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Last stored entry for `coord`, fresh or not
    pub fn lookup(&self, coord: &Coordinate) -> Option<CacheEntry> {
        let key = CacheKey::from(coord);
        let entry = self.entries.lock().get(&key).cloned();
        match &entry {
            Some(e) => tracing::debug!("Forecast cache hit for {} ({:?})", key, e.source()),
            None => tracing::debug!("Forecast cache miss for {}", key),
        }
        entry
    }

    /// Store a result stamped with the current time, then sweep stale entries
    pub fn store(&self, coord: &Coordinate, data: ForecastResult) {
        self.store_at(coord, data, Utc::now());
    }

    pub fn store_at(&self, coord: &Coordinate, data: ForecastResult, stored_at: DateTime<Utc>) {
        let key = CacheKey::from(coord);
        let mut entries = self.entries.lock();
        entries.insert(
            key,
            CacheEntry {
                key,
                data,
                stored_at,
            },
        );

        let before = entries.len();
        let ttl = self.ttl;
        let now = Utc::now();
        entries.retain(|_, entry| is_within(ttl, entry.stored_at, now));
        let swept = before - entries.len();
        if swept > 0 {
            tracing::debug!("Swept {} stale forecast cache entries", swept);
        }
    }

    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.is_fresh_at(entry, Utc::now())
    }

    pub fn is_fresh_at(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        is_within(self.ttl, entry.stored_at, now)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

fn is_within(ttl: Duration, stored_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    match (now - stored_at).to_std() {
        Ok(age) => age < ttl,
        // stored_at in the future: treat as just stored
        Err(_) => !ttl.is_zero(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ForecastMetadata, LocationInfo};
    use chrono::Duration as ChronoDuration;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    fn result(c: Coordinate, source: DataSource) -> ForecastResult {
        ForecastResult {
            success: true,
            location: LocationInfo {
                name: "Test".to_string(),
                region: "Test".to_string(),
                country: "Test".to_string(),
                coordinates: c,
            },
            forecast: vec![],
            metadata: ForecastMetadata {
                source,
                fallback_reason: None,
                retrieved_at: Utc::now(),
            },
        }
    }

    #[test]
    fn test_store_then_lookup() {
        let cache = ForecastCache::default();
        let c = coord(45.0, -93.0);
        assert!(cache.lookup(&c).is_none());

        cache.store(&c, result(c, DataSource::Api));
        let entry = cache.lookup(&c).unwrap();
        assert_eq!(entry.source(), DataSource::Api);
        assert!(cache.is_fresh(&entry));
    }

    #[test]
    fn test_near_identical_coordinates_share_key() {
        let cache = ForecastCache::default();
        let a = coord(45.000_000_1, -93.000_000_1);
        let b = coord(45.000_000_2, -93.000_000_3);
        cache.store(&a, result(a, DataSource::Api));
        assert!(cache.lookup(&b).is_some());
        assert!(cache.lookup(&coord(45.000_01, -93.0)).is_none());
    }

    #[test]
    fn test_store_overwrites() {
        let cache = ForecastCache::default();
        let c = coord(10.0, 10.0);
        cache.store(&c, result(c, DataSource::Fallback));
        cache.store(&c, result(c, DataSource::Api));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup(&c).unwrap().source(), DataSource::Api);
    }

    #[test]
    fn test_freshness_boundary() {
        let cache = ForecastCache::new(Duration::from_secs(600));
        let c = coord(1.0, 1.0);
        let stored_at = Utc::now();
        cache.store_at(&c, result(c, DataSource::Api), stored_at);
        let entry = cache.lookup(&c).unwrap();

        assert!(cache.is_fresh_at(&entry, stored_at + ChronoDuration::seconds(599)));
        assert!(!cache.is_fresh_at(&entry, stored_at + ChronoDuration::seconds(600)));
    }

    #[test]
    fn test_store_sweeps_stale_entries() {
        let cache = ForecastCache::new(Duration::from_secs(600));
        let recent = coord(1.0, 1.0);
        let fresh = coord(2.0, 2.0);
        let stale = coord(3.0, 3.0);

        cache.store_at(
            &recent,
            result(recent, DataSource::Api),
            Utc::now() - ChronoDuration::minutes(5),
        );
        cache.store(&fresh, result(fresh, DataSource::Fallback));
        assert_eq!(cache.len(), 2);

        // An entry already past the TTL is reclaimed by the sweep of its own store
        cache.store_at(
            &stale,
            result(stale, DataSource::Api),
            Utc::now() - ChronoDuration::hours(1),
        );
        assert_eq!(cache.len(), 2);
        assert!(cache.lookup(&stale).is_none());
        assert!(cache.lookup(&recent).is_some());
    }

    #[test]
    fn test_zero_ttl_is_never_fresh() {
        let cache = ForecastCache::new(Duration::ZERO);
        let c = coord(1.0, 1.0);
        cache.store(&c, result(c, DataSource::Api));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_display() {
        let key = CacheKey::from(&coord(45.5, -93.25));
        assert_eq!(key.to_string(), "45.500000,-93.250000");
    }
}
