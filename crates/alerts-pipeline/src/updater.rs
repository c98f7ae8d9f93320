//! Re-draw orchestration.
//!
//! Every redraw runs a base viewport pass over the filtered alert set with a
//! short zone slice per alert. A second "boost" pass then walks complete
//! zone lists for a small, targeted set of alerts:
//! - without a search, the alerts found at the viewport sample points
//! - with a search, the newest matching alerts from the full feed
//!
//! Boost features are merged after the base features, unique by id.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

use alerts_common::{Alert, BoundingBox, DrawSource};
use alerts_geometry::mercator::bounds_zoom;
use alerts_geometry::Viewport;

use crate::builder::{BuildMode, BuildOptions, BuildReport, DrawFeatureBuilder};
use crate::draw::DrawFeature;
use crate::filter::AlertFilter;
use crate::sampler::ViewportSampler;

/// Highest zoom a focus may ask for.
pub const MAX_FOCUS_ZOOM: u8 = 18;

/// Caps for the base and boost passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    pub viewport_pad: f64,
    pub batch_size: usize,
    pub base_zones_per_alert: usize,
    pub perf_base_zones_per_alert: usize,
    pub base_max_total_zones: usize,
    pub sample_max_total_zones: usize,
    pub perf_sample_max_total_zones: usize,
    pub search_max_total_zones: usize,
    pub perf_search_max_total_zones: usize,
    /// Matching alerts boosted during a search.
    pub search_boost_limit: usize,
    /// Zones fetched to locate an alert that is not drawn.
    pub focus_zone_limit: usize,
    pub focus_pad: f64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            viewport_pad: 0.55,
            batch_size: 24,
            base_zones_per_alert: 30,
            perf_base_zones_per_alert: 10,
            base_max_total_zones: 600,
            sample_max_total_zones: 700,
            perf_sample_max_total_zones: 260,
            search_max_total_zones: 520,
            perf_search_max_total_zones: 220,
            search_boost_limit: 80,
            focus_zone_limit: 6,
            focus_pad: 0.25,
        }
    }
}

/// One redraw: where the map is and what the user filtered for.
#[derive(Debug, Clone)]
pub struct DrawRequest {
    pub viewport: Viewport,
    pub filter: AlertFilter,
    /// Lower zone caps.
    pub performance: bool,
}

/// Merged draw set plus pass statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DrawOutcome {
    pub features: Vec<DrawFeature>,
    pub base: BuildReport,
    pub boost: Option<BuildReport>,
    /// Boost features that were not already in the base set.
    pub boosted_added: usize,
    pub searching: bool,
}

/// Where the map should move to show an alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusTarget {
    pub alert_id: String,
    pub bounds: BoundingBox,
    /// `(lon, lat)`.
    pub center: (f64, f64),
    pub zoom: u8,
    /// Whether the bounds came from shapes already drawn.
    pub from_drawn: bool,
}

pub struct DrawUpdater {
    builder: Arc<DrawFeatureBuilder>,
    sampler: Option<Arc<ViewportSampler>>,
    config: UpdaterConfig,
}

impl DrawUpdater {
    pub fn new(builder: Arc<DrawFeatureBuilder>, config: UpdaterConfig) -> Self {
        Self {
            builder,
            sampler: None,
            config,
        }
    }

    pub fn with_sampler(mut self, sampler: Arc<ViewportSampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    pub fn builder(&self) -> &Arc<DrawFeatureBuilder> {
        &self.builder
    }

    fn base_options(&self, performance: bool) -> BuildOptions {
        BuildOptions {
            max_zones_per_alert: if performance {
                self.config.perf_base_zones_per_alert
            } else {
                self.config.base_zones_per_alert
            },
            viewport_pad: self.config.viewport_pad,
            mode: BuildMode::Viewport,
            exhaustive: false,
            max_total_zones: self.config.base_max_total_zones,
            batch_size: self.config.batch_size,
        }
    }

    fn boost_options(&self, max_total_zones: usize) -> BuildOptions {
        BuildOptions {
            max_zones_per_alert: usize::MAX,
            viewport_pad: self.config.viewport_pad,
            mode: BuildMode::Viewport,
            exhaustive: true,
            max_total_zones,
            batch_size: self.config.batch_size,
        }
    }

    /// Compute the draw set for one request over the full alert set.
    #[instrument(
        skip(self, alerts, request),
        fields(alerts = alerts.len(), zoom = request.viewport.zoom)
    )]
    pub async fn update(&self, alerts: &[Alert], request: &DrawRequest) -> DrawOutcome {
        let shown: Vec<&Alert> = request.filter.apply(alerts);
        let searching = request.filter.has_query();

        let mut base = self
            .builder
            .build(&shown, &request.viewport, &self.base_options(request.performance))
            .await;
        let mut features = std::mem::take(&mut base.features);

        let mut boost = if searching {
            let mut matching = shown;
            matching.sort_by(|a, b| b.sent.cmp(&a.sent));
            matching.truncate(self.config.search_boost_limit);

            let cap = if request.performance {
                self.config.perf_search_max_total_zones
            } else {
                self.config.search_max_total_zones
            };
            Some(
                self.builder
                    .build(&matching, &request.viewport, &self.boost_options(cap))
                    .await,
            )
        } else if let Some(sampler) = &self.sampler {
            let samples: Vec<Alert> = sampler
                .sample(&request.viewport)
                .await
                .into_iter()
                .filter(|a| request.filter.matches(a))
                .collect();

            if samples.is_empty() {
                None
            } else {
                let cap = if request.performance {
                    self.config.perf_sample_max_total_zones
                } else {
                    self.config.sample_max_total_zones
                };
                Some(
                    self.builder
                        .build(&samples, &request.viewport, &self.boost_options(cap))
                        .await,
                )
            }
        } else {
            None
        };

        let mut boosted_added = 0;
        if let Some(report) = boost.as_mut() {
            let before = features.len();
            merge_by_id(&mut features, report.features.drain(..));
            boosted_added = features.len() - before;
        }

        let outcome = DrawOutcome {
            features,
            base,
            boost,
            boosted_added,
            searching,
        };

        debug!(
            features = outcome.features.len(),
            boosted = outcome.boosted_added,
            searching,
            "Draw set updated"
        );
        outcome
    }

    /// Bounds for an alert that has nothing drawn yet.
    ///
    /// Native geometry is used directly; zone-only alerts resolve their
    /// first few zones. The union is padded and fitted to a
    /// `width_px` x `height_px` view.
    pub async fn locate(
        &self,
        alert: &Alert,
        width_px: f64,
        height_px: f64,
    ) -> Option<FocusTarget> {
        let bounds = match alert.draw_source() {
            DrawSource::Native(geometry) => geometry.bbox()?,
            DrawSource::Zones(urls) => {
                let take = urls.len().min(self.config.focus_zone_limit);
                self.builder
                    .resolver()
                    .resolve_batch(&urls[..take])
                    .await
                    .into_iter()
                    .flatten()
                    .map(|zone| zone.bbox)
                    .reduce(|a, b| a.union(&b))?
            }
            DrawSource::None => return None,
        };

        let padded = bounds.pad(self.config.focus_pad);
        Some(FocusTarget {
            alert_id: alert.id.clone(),
            bounds: padded,
            center: padded.center(),
            zoom: bounds_zoom(&padded, width_px, height_px, MAX_FOCUS_ZOOM),
            from_drawn: false,
        })
    }
}

/// Append features whose id is not already present.
pub fn merge_by_id<I: IntoIterator<Item = DrawFeature>>(target: &mut Vec<DrawFeature>, extra: I) {
    let mut seen: HashSet<String> = target.iter().map(|f| f.id.clone()).collect();
    for feature in extra {
        if seen.insert(feature.id.clone()) {
            target.push(feature);
        }
    }
}
