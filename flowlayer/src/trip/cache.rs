//! Session-scoped trip cache.
//!
//! Routes and trips are computed once per session and reused when a layer
//! remounts, so a remount never refetches route files or rebuilds
//! timestamps. Entries are keyed by the inputs that determine the result:
//! the route file list, the particle count, and the trip duration.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use super::Trip;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    files: Vec<String>,
    particles_per_route: u32,
    /// Bit pattern of the duration; exact-value identity is what we want.
    trip_duration_bits: u64,
}

impl CacheKey {
    fn new(files: &[String], particles_per_route: u32, trip_duration_ms: f64) -> Self {
        Self {
            files: files.to_vec(),
            particles_per_route,
            trip_duration_bits: trip_duration_ms.to_bits(),
        }
    }
}

/// Cache of built trips, shared across layer mounts.
#[derive(Debug, Default)]
pub struct TripCache {
    inner: DashMap<CacheKey, Arc<Vec<Trip>>>,
}

impl TripCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache used when no explicit cache is injected.
    ///
    /// Survives layer remounts for the lifetime of the process, which is
    /// the behavior mounting code expects by default. Tests inject their
    /// own caches to stay isolated.
    pub fn global() -> Arc<TripCache> {
        static GLOBAL: OnceLock<Arc<TripCache>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(TripCache::new())))
    }

    /// Look up trips built earlier in this session for the same inputs.
    pub fn get(
        &self,
        files: &[String],
        particles_per_route: u32,
        trip_duration_ms: f64,
    ) -> Option<Arc<Vec<Trip>>> {
        self.inner
            .get(&CacheKey::new(files, particles_per_route, trip_duration_ms))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Store built trips for reuse on remount.
    pub fn insert(
        &self,
        files: &[String],
        particles_per_route: u32,
        trip_duration_ms: f64,
        trips: Arc<Vec<Trip>>,
    ) {
        self.inner.insert(
            CacheKey::new(files, particles_per_route, trip_duration_ms),
            trips,
        );
    }

    /// Number of cached sessions.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drop all cached trips.
    pub fn clear(&self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files() -> Vec<String> {
        vec!["http://r/1.json".to_string(), "http://r/2.json".to_string()]
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = TripCache::new();
        assert!(cache.get(&files(), 15, 10_000.0).is_none());

        let trips = Arc::new(Vec::new());
        cache.insert(&files(), 15, 10_000.0, Arc::clone(&trips));

        let hit = cache.get(&files(), 15, 10_000.0).unwrap();
        assert!(Arc::ptr_eq(&hit, &trips));
    }

    #[test]
    fn test_key_includes_all_inputs() {
        let cache = TripCache::new();
        cache.insert(&files(), 15, 10_000.0, Arc::new(Vec::new()));

        assert!(cache.get(&files(), 16, 10_000.0).is_none());
        assert!(cache.get(&files(), 15, 10_001.0).is_none());
        assert!(cache.get(&files()[..1], 15, 10_000.0).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let cache = TripCache::new();
        cache.insert(&files(), 1, 1.0, Arc::new(Vec::new()));
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_global_is_shared() {
        let a = TripCache::global();
        let b = TripCache::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
