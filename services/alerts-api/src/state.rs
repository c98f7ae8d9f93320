//! Application state for the alerts API.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use metrics::{counter, gauge};
use serde::Serialize;
use tracing::{error, info, instrument};

use alerts_cache::{LruSimplificationCache, MemoryZoneCache, SimplificationCache, ZoneCache};
use alerts_common::AlertResult;
use alerts_pipeline::{
    build_http_client, AlertSource, AlertStore, Clock, DrawFeatureBuilder, DrawUpdater,
    HttpZoneFetcher, NwsFeedClient, RefreshOutcome, StatusKind, SystemClock, ViewportSampler,
    ZoneFetcher, ZoneOverlayBuilder, ZoneResolver,
};

use crate::config::ServiceConfig;

/// Shared application state.
pub struct AppState {
    pub config: ServiceConfig,
    pub source: Arc<dyn AlertSource>,
    pub store: Arc<AlertStore>,
    pub builder: Arc<DrawFeatureBuilder>,
    pub updater: DrawUpdater,
    pub overlay: ZoneOverlayBuilder,
    pub clock: Arc<dyn Clock>,
    zone_cache: Arc<MemoryZoneCache>,
    simplify_cache: Arc<LruSimplificationCache>,
    started: Instant,
}

/// Cache counters reported by `/status`.
#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub zone_entries: usize,
    pub zone_hits: u64,
    pub zone_misses: u64,
    pub zone_hit_rate: f64,
    pub zones_resolved: u64,
    pub zones_unavailable: u64,
    pub simplified_entries: usize,
    pub simplified_hits: u64,
    pub simplified_misses: u64,
    pub simplified_evictions: u64,
}

impl AppState {
    /// State talking to the real NWS API.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let client = build_http_client(&config.feed)?;
        let source = Arc::new(NwsFeedClient::with_client(client.clone(), config.feed.clone()));
        let fetcher = Arc::new(HttpZoneFetcher::with_client(client));
        Ok(Self::with_parts(
            config,
            source,
            fetcher,
            Arc::new(SystemClock),
        ))
    }

    /// State over injected upstreams.
    pub fn with_parts(
        config: ServiceConfig,
        source: Arc<dyn AlertSource>,
        fetcher: Arc<dyn ZoneFetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let zone_cache = Arc::new(MemoryZoneCache::new());
        let simplify_cache = Arc::new(LruSimplificationCache::new(config.simplify_cache_capacity));

        let resolver = Arc::new(ZoneResolver::new(fetcher, zone_cache.clone()));
        let builder = Arc::new(DrawFeatureBuilder::new(resolver, simplify_cache.clone()));

        let mut updater = DrawUpdater::new(builder.clone(), config.updater.clone());
        if config.sample_viewport {
            updater = updater.with_sampler(Arc::new(ViewportSampler::new(
                source.clone(),
                clock.clone(),
                config.sample_throttle(),
            )));
        }
        let overlay =
            ZoneOverlayBuilder::new(builder.clone()).with_concurrency(config.overlay_concurrency);

        Self {
            config,
            source,
            store: Arc::new(AlertStore::new()),
            builder,
            updater,
            overlay,
            clock,
            zone_cache,
            simplify_cache,
            started: Instant::now(),
        }
    }

    /// Pull the active feed into the store.
    ///
    /// On failure the previous alerts stay in place and the status turns bad.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> AlertResult<RefreshOutcome> {
        self.store
            .set_status(StatusKind::Info, "Loading alerts...")
            .await;
        let started = Instant::now();

        match self.source.active_alerts().await {
            Ok(alerts) => {
                let outcome = self.store.replace(alerts, Utc::now()).await;
                counter!("alerts_feed_refreshes_total").increment(1);
                gauge!("alerts_active").set(outcome.total as f64);
                info!(
                    total = outcome.total,
                    new = outcome.new_ids.len(),
                    first_load = outcome.first_load,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Alerts refreshed"
                );
                Ok(outcome)
            }
            Err(e) => {
                counter!("alerts_feed_failures_total").increment(1);
                error!(error = %e, "Alert refresh failed");
                self.store.record_failure(&e.to_string(), Utc::now()).await;
                Err(e)
            }
        }
    }

    pub async fn cache_report(&self) -> CacheReport {
        let zone_stats = self.zone_cache.stats();
        CacheReport {
            zone_entries: self.zone_cache.len().await,
            zone_hits: zone_stats.hits,
            zone_misses: zone_stats.misses,
            zone_hit_rate: zone_stats.hit_rate(),
            zones_resolved: zone_stats.resolved,
            zones_unavailable: zone_stats.unavailable,
            simplified_entries: self.simplify_cache.len().await,
            simplified_hits: self.simplify_cache.hits(),
            simplified_misses: self.simplify_cache.misses(),
            simplified_evictions: self.simplify_cache.evictions(),
        }
    }

    /// Drop every cached zone, including ones recorded as unavailable.
    pub async fn clear_caches(&self) {
        self.zone_cache.clear().await;
        self.simplify_cache.clear().await;
        info!("Zone caches cleared");
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
