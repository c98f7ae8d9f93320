//! Cache abstractions for the alert draw pipeline.
//!
//! Both caches are explicit objects handed to the pipeline, so tests and
//! services choose their own instances instead of sharing module state:
//! - Zone cache: zone URL -> resolved zone or a terminal "no geometry"
//! - Simplification cache: (zone URL, tolerance, zoom) -> simplified zone

pub mod simplify_cache;
pub mod zone_cache;

pub use simplify_cache::{
    LruSimplificationCache, SimplificationCache, SimplifyKey, DEFAULT_SIMPLIFY_CAPACITY,
};
pub use zone_cache::{MemoryZoneCache, ZoneCache, ZoneCacheStats, ZoneEntry};
