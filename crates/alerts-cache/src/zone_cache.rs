//! Session cache for zone geometry.
//!
//! Entries never expire and are never evicted: the zone catalog touched in a
//! session is small and static. A cached `None` is terminal, so a zone that
//! failed once stays missing until the cache is cleared.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use alerts_common::Zone;

/// A resolved zone, or `None` when the lookup produced no usable geometry.
pub type ZoneEntry = Option<Arc<Zone>>;

/// Storage for resolved zones keyed by zone URL.
#[async_trait]
pub trait ZoneCache: Send + Sync {
    /// `None` when the URL was never resolved, `Some(entry)` otherwise.
    async fn get(&self, url: &str) -> Option<ZoneEntry>;

    async fn set(&self, url: &str, entry: ZoneEntry);

    async fn has(&self, url: &str) -> bool;

    async fn len(&self) -> usize;

    async fn clear(&self);

    fn stats(&self) -> ZoneCacheStats;
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ZoneCacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries holding a zone.
    pub resolved: u64,
    /// Entries recorded as "no geometry".
    pub unavailable: u64,
}

impl ZoneCacheStats {
    /// Hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// In-memory [`ZoneCache`] backed by a `HashMap`.
#[derive(Default)]
pub struct MemoryZoneCache {
    entries: RwLock<HashMap<String, ZoneEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    resolved: AtomicU64,
    unavailable: AtomicU64,
}

impl MemoryZoneCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn count_entry(&self, entry: &ZoneEntry, delta_up: bool) {
        let counter = if entry.is_some() {
            &self.resolved
        } else {
            &self.unavailable
        };
        if delta_up {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            counter.fetch_sub(1, Ordering::Relaxed);
        }
    }
}

#[async_trait]
impl ZoneCache for MemoryZoneCache {
    async fn get(&self, url: &str) -> Option<ZoneEntry> {
        let entries = self.entries.read().await;
        match entries.get(url) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    async fn set(&self, url: &str, entry: ZoneEntry) {
        let mut entries = self.entries.write().await;
        self.count_entry(&entry, true);
        if let Some(previous) = entries.insert(url.to_string(), entry) {
            self.count_entry(&previous, false);
        }
    }

    async fn has(&self, url: &str) -> bool {
        self.entries.read().await.contains_key(url)
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn clear(&self) {
        self.entries.write().await.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.resolved.store(0, Ordering::Relaxed);
        self.unavailable.store(0, Ordering::Relaxed);
    }

    fn stats(&self) -> ZoneCacheStats {
        ZoneCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            resolved: self.resolved.load(Ordering::Relaxed),
            unavailable: self.unavailable.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerts_common::{AlertGeometry, BoundingBox};

    fn zone(url: &str) -> Arc<Zone> {
        Arc::new(Zone {
            url: url.to_string(),
            id: url.to_string(),
            name: String::new(),
            geometry: AlertGeometry::polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]),
            bbox: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
        })
    }

    #[tokio::test]
    async fn test_get_distinguishes_missing_from_unavailable() {
        let cache = MemoryZoneCache::new();

        assert!(cache.get("https://z/1").await.is_none());
        cache.set("https://z/1", None).await;

        let entry = cache.get("https://z/1").await;
        assert!(matches!(entry, Some(None)));
        assert!(cache.has("https://z/1").await);
    }

    #[tokio::test]
    async fn test_stats_track_entries() {
        let cache = MemoryZoneCache::new();
        cache.set("a", Some(zone("a"))).await;
        cache.set("b", None).await;
        cache.get("a").await;
        cache.get("c").await;

        let stats = cache.stats();
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.unavailable, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 50.0);

        // Overwriting a failure with a zone moves the counts.
        cache.set("b", Some(zone("b"))).await;
        let stats = cache.stats();
        assert_eq!(stats.resolved, 2);
        assert_eq!(stats.unavailable, 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = MemoryZoneCache::new();
        cache.set("a", Some(zone("a"))).await;
        assert_eq!(cache.len().await, 1);

        cache.clear().await;
        assert_eq!(cache.len().await, 0);
        assert_eq!(cache.stats().resolved, 0);
    }
}
