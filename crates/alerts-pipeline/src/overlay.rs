//! Deduplicated zone overlay.
//!
//! Instead of one shard per (alert, zone), every referenced zone is drawn
//! once and carries all alert ids naming it, styled by the best severity
//! among them.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use alerts_common::{Alert, AlertGeometry, BoundingBox, DrawSource, Severity};
use alerts_geometry::{tolerance_for_zoom, Viewport, ViewportFilter};

use crate::builder::DrawFeatureBuilder;
use crate::draw::DrawFeature;
use crate::zones::DEFAULT_POOL_CONCURRENCY;

/// One zone shared by one or more alerts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayFeature {
    pub zone_url: String,
    pub zone_id: String,
    pub zone_name: String,
    /// In feed order, without duplicates.
    pub alert_ids: Vec<String>,
    pub severity: Severity,
    pub geometry: AlertGeometry,
    pub bbox: BoundingBox,
}

/// Native polygons plus deduplicated zones.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OverlaySet {
    pub native: Vec<DrawFeature>,
    pub zones: Vec<OverlayFeature>,
    pub zones_requested: usize,
    pub zones_unavailable: usize,
}

pub struct ZoneOverlayBuilder {
    builder: Arc<DrawFeatureBuilder>,
    concurrency: usize,
}

impl ZoneOverlayBuilder {
    pub fn new(builder: Arc<DrawFeatureBuilder>) -> Self {
        Self {
            builder,
            concurrency: DEFAULT_POOL_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Build the overlay. With a viewport, zones are filtered against it
    /// (padded by `pad`) and simplified for its zoom.
    #[instrument(skip(self, alerts), fields(alerts = alerts.len()))]
    pub async fn build(
        &self,
        alerts: &[Alert],
        viewport: Option<&Viewport>,
        pad: f64,
    ) -> OverlaySet {
        let mut set = OverlaySet::default();

        let mut order: Vec<String> = Vec::new();
        let mut referencing: HashMap<String, Vec<&Alert>> = HashMap::new();

        for alert in alerts {
            match alert.draw_source() {
                DrawSource::Native(geometry) => {
                    set.native.extend(DrawFeature::native(alert, geometry));
                }
                DrawSource::Zones(urls) => {
                    for url in urls {
                        let entry = referencing.entry(url.clone()).or_insert_with(|| {
                            order.push(url.clone());
                            Vec::new()
                        });
                        if !entry.iter().any(|a| a.id == alert.id) {
                            entry.push(alert);
                        }
                    }
                }
                DrawSource::None => {}
            }
        }

        set.zones_requested = order.len();
        let resolved: HashMap<_, _> = self
            .builder
            .resolver()
            .resolve_pool(&order, self.concurrency)
            .await
            .into_iter()
            .collect();

        let filter = viewport.map(|vp| ViewportFilter::new(vp, pad));

        for url in &order {
            let Some(Some(zone)) = resolved.get(url) else {
                set.zones_unavailable += 1;
                continue;
            };
            if filter.as_ref().is_some_and(|f| !f.accepts(&zone.bbox)) {
                continue;
            }

            let zone = match viewport {
                Some(vp) => {
                    self.builder
                        .simplify_zone(zone, tolerance_for_zoom(vp.zoom), vp.zoom)
                        .await
                }
                None => zone.clone(),
            };

            let alerts = referencing.get(url).map(Vec::as_slice).unwrap_or_default();
            set.zones.push(OverlayFeature {
                zone_url: url.clone(),
                zone_id: zone.id.clone(),
                zone_name: zone.name.clone(),
                alert_ids: alerts.iter().map(|a| a.id.clone()).collect(),
                severity: Severity::best(alerts.iter().map(|a| a.severity)),
                geometry: zone.geometry.clone(),
                bbox: zone.bbox,
            });
        }

        debug!(
            native = set.native.len(),
            zones = set.zones.len(),
            unavailable = set.zones_unavailable,
            "Zone overlay built"
        );
        set
    }
}
