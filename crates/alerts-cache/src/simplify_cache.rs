//! LRU cache of simplified zone shapes.
//!
//! Keyed by zone URL, pixel tolerance and zoom. Tolerance is keyed by its
//! exact bit pattern so two tiers can never collide through rounding.

use async_trait::async_trait;
use lru::LruCache;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use alerts_common::Zone;

/// Default number of simplified shapes kept.
pub const DEFAULT_SIMPLIFY_CAPACITY: usize = 20_000;

/// Identity of one simplified shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SimplifyKey {
    pub zone_url: String,
    tolerance_bits: u64,
    pub zoom: u8,
}

impl SimplifyKey {
    pub fn new(zone_url: impl Into<String>, tolerance_px: f64, zoom: u8) -> Self {
        Self {
            zone_url: zone_url.into(),
            tolerance_bits: tolerance_px.to_bits(),
            zoom,
        }
    }

    pub fn tolerance(&self) -> f64 {
        f64::from_bits(self.tolerance_bits)
    }
}

impl fmt::Display for SimplifyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::tol:{}::z:{}",
            self.zone_url,
            self.tolerance(),
            self.zoom
        )
    }
}

#[async_trait]
pub trait SimplificationCache: Send + Sync {
    async fn get(&self, key: &SimplifyKey) -> Option<Arc<Zone>>;

    async fn set(&self, key: SimplifyKey, zone: Arc<Zone>);

    async fn len(&self) -> usize;

    async fn clear(&self);
}

/// Bounded [`SimplificationCache`] with least-recently-used eviction.
pub struct LruSimplificationCache {
    cache: RwLock<LruCache<SimplifyKey, Arc<Zone>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl LruSimplificationCache {
    /// A zero capacity is bumped to one entry.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RwLock::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
}

impl Default for LruSimplificationCache {
    fn default() -> Self {
        Self::new(DEFAULT_SIMPLIFY_CAPACITY)
    }
}

#[async_trait]
impl SimplificationCache for LruSimplificationCache {
    async fn get(&self, key: &SimplifyKey) -> Option<Arc<Zone>> {
        // LRU reads reorder entries, so a write lock is needed.
        let mut cache = self.cache.write().await;
        match cache.get(key) {
            Some(zone) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(zone.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    async fn set(&self, key: SimplifyKey, zone: Arc<Zone>) {
        let mut cache = self.cache.write().await;
        if let Some((evicted, _)) = cache.push(key.clone(), zone) {
            if evicted != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = %evicted, "Evicted simplified zone");
            }
        }
    }

    async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    async fn clear(&self) {
        self.cache.write().await.clear();
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

    #[test]
    fn test_key_display() {
        let key = SimplifyKey::new("https://z/NYZ072", 1.8, 7);
        assert_eq!(key.to_string(), "https://z/NYZ072::tol:1.8::z:7");
    }

    #[test]
    fn test_keys_differ_by_tolerance_and_zoom() {
        let a = SimplifyKey::new("u", 1.0, 9);
        assert_ne!(a, SimplifyKey::new("u", 1.8, 9));
        assert_ne!(a, SimplifyKey::new("u", 1.0, 10));
        assert_eq!(a, SimplifyKey::new("u", 1.0, 9));
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let cache = LruSimplificationCache::new(2);
        cache.set(SimplifyKey::new("a", 1.0, 9), zone("a")).await;
        cache.set(SimplifyKey::new("b", 1.0, 9), zone("b")).await;

        // Touch "a" so "b" is least recently used.
        assert!(cache.get(&SimplifyKey::new("a", 1.0, 9)).await.is_some());
        cache.set(SimplifyKey::new("c", 1.0, 9), zone("c")).await;

        assert!(cache.get(&SimplifyKey::new("b", 1.0, 9)).await.is_none());
        assert!(cache.get(&SimplifyKey::new("a", 1.0, 9)).await.is_some());
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.evictions(), 1);
        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 1);
    }

    #[tokio::test]
    async fn test_overwrite_is_not_eviction() {
        let cache = LruSimplificationCache::new(4);
        let key = SimplifyKey::new("a", 0.6, 12);
        cache.set(key.clone(), zone("a")).await;
        cache.set(key.clone(), zone("a")).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.evictions(), 0);
    }
}
