//! Zone geometry resolution.
//!
//! Alerts issued by zone rather than polygon list zone URLs. Each URL is
//! fetched at most once per cache lifetime; failures are remembered as
//! "no geometry" so a broken zone never costs a second request.

use async_trait::async_trait;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use metrics::counter;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use alerts_cache::{ZoneCache, ZoneEntry};
use alerts_common::{AlertResult, Zone};

use crate::feed::{build_http_client, get_json, FeedConfig};

/// Default lookups in flight for pooled resolution.
pub const DEFAULT_POOL_CONCURRENCY: usize = 10;

/// Fetches the raw GeoJSON body for a zone URL.
#[async_trait]
pub trait ZoneFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> AlertResult<Value>;
}

/// [`ZoneFetcher`] over HTTP. Non-success statuses are errors.
#[derive(Clone)]
pub struct HttpZoneFetcher {
    client: Client,
}

impl HttpZoneFetcher {
    pub fn new(config: &FeedConfig) -> AlertResult<Self> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ZoneFetcher for HttpZoneFetcher {
    async fn fetch(&self, url: &str) -> AlertResult<Value> {
        get_json(&self.client, url).await
    }
}

/// Cached zone lookups on top of a [`ZoneFetcher`].
pub struct ZoneResolver {
    fetcher: Arc<dyn ZoneFetcher>,
    cache: Arc<dyn ZoneCache>,
}

impl ZoneResolver {
    pub fn new(fetcher: Arc<dyn ZoneFetcher>, cache: Arc<dyn ZoneCache>) -> Self {
        Self { fetcher, cache }
    }

    pub fn cache(&self) -> &Arc<dyn ZoneCache> {
        &self.cache
    }

    pub async fn is_cached(&self, url: &str) -> bool {
        self.cache.has(url).await
    }

    /// Resolve one zone URL, fetching only on a cache miss.
    ///
    /// Every failure mode (transport, status, body shape, geometry type)
    /// is cached as `None`.
    pub async fn resolve(&self, url: &str) -> ZoneEntry {
        if let Some(entry) = self.cache.get(url).await {
            counter!("alerts_zone_cache_hits_total").increment(1);
            return entry;
        }

        counter!("alerts_zone_cache_misses_total").increment(1);
        counter!("alerts_zone_fetches_total").increment(1);
        let entry = match self.fetcher.fetch(url).await {
            Ok(body) => match Zone::from_feature(url, &body) {
                Some(zone) => Some(Arc::new(zone)),
                None => {
                    debug!(url = %url, "Zone body has no usable geometry");
                    counter!("alerts_zone_unavailable_total").increment(1);
                    None
                }
            },
            Err(e) => {
                warn!(url = %url, error = %e, "Zone fetch failed");
                counter!("alerts_zone_unavailable_total").increment(1);
                None
            }
        };

        self.cache.set(url, entry.clone()).await;
        entry
    }

    /// Resolve a batch concurrently; output order matches `urls`.
    pub async fn resolve_batch(&self, urls: &[String]) -> Vec<ZoneEntry> {
        join_all(urls.iter().map(|url| self.resolve(url))).await
    }

    /// Resolve through a fixed-size pool of lookups. Order is not kept.
    pub async fn resolve_pool(&self, urls: &[String], concurrency: usize) -> Vec<(String, ZoneEntry)> {
        stream::iter(urls.iter().cloned())
            .map(|url| async move {
                let entry = self.resolve(&url).await;
                (url, entry)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await
    }
}
