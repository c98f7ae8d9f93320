//! Draw-set building for one map view.
//!
//! Native alert polygons pass straight through. Zone-only alerts have their
//! zones resolved in batches, dropped when outside the padded viewport,
//! simplified for the zoom and tagged back to the alert. A global budget on
//! zones considered bounds the cost of a single pass.

use metrics::counter;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

use alerts_cache::{SimplificationCache, SimplifyKey};
use alerts_common::{Alert, DrawSource, Zone};
use alerts_geometry::{
    simplify_geometry, tolerance_for_zoom, Viewport, ViewportFilter, DEFAULT_VIEWPORT_PAD,
};

use crate::draw::DrawFeature;
use crate::zones::ZoneResolver;

/// Whether resolved zones are filtered against the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Viewport,
    All,
}

/// Knobs for one build pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Zones taken per alert unless `exhaustive`.
    pub max_zones_per_alert: usize,
    pub viewport_pad: f64,
    pub mode: BuildMode,
    /// Take every zone of every alert.
    pub exhaustive: bool,
    /// Zones considered per pass, cached or not.
    pub max_total_zones: usize,
    /// Zones resolved concurrently.
    pub batch_size: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            max_zones_per_alert: 30,
            viewport_pad: DEFAULT_VIEWPORT_PAD,
            mode: BuildMode::Viewport,
            exhaustive: false,
            max_total_zones: 600,
            batch_size: 24,
        }
    }
}

/// Outcome of a build pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<DrawFeature>,
    pub native_features: usize,
    pub zone_features: usize,
    pub zones_considered: usize,
    /// Zones with no geometry (failed fetch or unusable body).
    pub zones_unavailable: usize,
    /// Zones dropped by the viewport filter.
    pub zones_outside: usize,
    /// Alerts with neither geometry nor zones.
    pub undrawable_alerts: usize,
    /// Some zones were left unresolved because the budget ran out.
    pub cap_reached: bool,
    pub elapsed_ms: u64,
}

/// Builds draw features from alerts using injected caches.
pub struct DrawFeatureBuilder {
    resolver: Arc<ZoneResolver>,
    simplified: Arc<dyn SimplificationCache>,
}

impl DrawFeatureBuilder {
    pub fn new(resolver: Arc<ZoneResolver>, simplified: Arc<dyn SimplificationCache>) -> Self {
        Self { resolver, simplified }
    }

    pub fn resolver(&self) -> &Arc<ZoneResolver> {
        &self.resolver
    }

    pub fn simplification_cache(&self) -> &Arc<dyn SimplificationCache> {
        &self.simplified
    }

    /// Build the draw set for `alerts` as seen through `viewport`.
    ///
    /// Never fails: unavailable zones are left out of the result.
    #[instrument(skip(self, alerts, options), fields(alerts = alerts.len(), zoom = viewport.zoom))]
    pub async fn build<A: Borrow<Alert> + Sync>(
        &self,
        alerts: &[A],
        viewport: &Viewport,
        options: &BuildOptions,
    ) -> BuildReport {
        let start = Instant::now();
        let filter = ViewportFilter::new(viewport, options.viewport_pad);
        let tolerance = tolerance_for_zoom(viewport.zoom);
        let batch_size = options.batch_size.max(1);

        let mut report = BuildReport::default();

        for alert in alerts {
            let alert: &Alert = alert.borrow();
            let urls = match alert.draw_source() {
                DrawSource::Native(geometry) => {
                    if let Some(feature) = DrawFeature::native(alert, geometry) {
                        report.features.push(feature);
                        report.native_features += 1;
                    }
                    continue;
                }
                DrawSource::Zones(urls) => urls,
                DrawSource::None => {
                    report.undrawable_alerts += 1;
                    continue;
                }
            };

            // A zone listed twice would otherwise yield duplicate feature ids.
            let mut unique = HashSet::new();
            let urls: Vec<String> = urls
                .iter()
                .filter(|url| unique.insert(url.as_str()))
                .cloned()
                .collect();

            let take = if options.exhaustive {
                urls.len()
            } else {
                urls.len().min(options.max_zones_per_alert)
            };

            for batch in urls[..take].chunks(batch_size) {
                let remaining = options.max_total_zones.saturating_sub(report.zones_considered);
                if remaining == 0 {
                    report.cap_reached = true;
                    break;
                }
                if batch.len() > remaining {
                    report.cap_reached = true;
                }
                let batch = &batch[..batch.len().min(remaining)];
                report.zones_considered += batch.len();

                for entry in self.resolver.resolve_batch(batch).await {
                    let Some(zone) = entry else {
                        report.zones_unavailable += 1;
                        continue;
                    };

                    if options.mode == BuildMode::Viewport && !filter.accepts(&zone.bbox) {
                        report.zones_outside += 1;
                        continue;
                    }

                    let simplified = self.simplify_zone(&zone, tolerance, viewport.zoom).await;
                    report.features.push(DrawFeature::zone(alert, &simplified));
                    report.zone_features += 1;
                }
            }
        }

        report.elapsed_ms = start.elapsed().as_millis() as u64;
        counter!("alerts_draw_features_total").increment(report.features.len() as u64);
        debug!(
            features = report.features.len(),
            native = report.native_features,
            zones = report.zone_features,
            considered = report.zones_considered,
            cap_reached = report.cap_reached,
            elapsed_ms = report.elapsed_ms,
            "Draw set built"
        );
        report
    }

    /// Simplified copy of a zone, cached per (url, tolerance, zoom).
    pub(crate) async fn simplify_zone(
        &self,
        zone: &Arc<Zone>,
        tolerance: f64,
        zoom: u8,
    ) -> Arc<Zone> {
        let key = SimplifyKey::new(zone.url.clone(), tolerance, zoom);
        if let Some(cached) = self.simplified.get(&key).await {
            return cached;
        }

        let geometry = simplify_geometry(&zone.geometry, tolerance, zoom);
        let simplified = Arc::new(zone.with_geometry(geometry));
        self.simplified.set(key, simplified.clone()).await;
        simplified
    }
}
