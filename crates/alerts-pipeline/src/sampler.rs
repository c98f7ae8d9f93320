//! Viewport sampling: which alerts cover the center and corners of a view.
//!
//! Five point queries are a cheap existence check for alerts that certainly
//! touch the view. Sampling is throttled per view: inside the window the
//! same view reuses its previous samples, while a different view is
//! sampled on its own.

use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use alerts_common::Alert;
use alerts_geometry::Viewport;

use crate::feed::AlertSource;
use crate::timing::{Clock, Throttle, ThrottleDecision};

/// Minimum spacing between sampling rounds for the same view.
pub const DEFAULT_SAMPLE_THROTTLE: Duration = Duration::from_millis(1200);

struct SampledView {
    throttle: Throttle,
    ran_at: Instant,
    alerts: Vec<Alert>,
}

pub struct ViewportSampler {
    source: Arc<dyn AlertSource>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    /// Keyed by the quantized viewport bounds.
    views: Mutex<HashMap<String, SampledView>>,
}

impl ViewportSampler {
    pub fn new(source: Arc<dyn AlertSource>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            source,
            clock,
            interval,
            views: Mutex::new(HashMap::new()),
        }
    }

    /// Alerts found at the viewport sample points, unique by id.
    ///
    /// Failed point queries are skipped. When the same view was sampled
    /// within the throttle window its previous alerts are returned.
    pub async fn sample(&self, viewport: &Viewport) -> Vec<Alert> {
        let key = viewport.bounds.cache_key();
        let now = self.clock.now();

        {
            let mut views = self.views.lock().await;
            // Entries past their window would run again anyway.
            views.retain(|_, view| now.saturating_duration_since(view.ran_at) < self.interval);

            match views.get_mut(&key) {
                Some(view) => {
                    let decision = view.throttle.check(now);
                    if decision != ThrottleDecision::RunNow {
                        debug!(?decision, view = %key, "Viewport sampling throttled");
                        return view.alerts.clone();
                    }
                    view.ran_at = now;
                }
                None => {
                    let mut throttle = Throttle::new(self.interval);
                    throttle.check(now);
                    views.insert(
                        key.clone(),
                        SampledView {
                            throttle,
                            ran_at: now,
                            alerts: Vec::new(),
                        },
                    );
                }
            }
        }

        let queries = viewport
            .sample_points()
            .into_iter()
            .map(|(lat, lon)| self.source.alerts_at_point(lat, lon));

        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for result in join_all(queries).await {
            match result {
                Ok(alerts) => {
                    for alert in alerts {
                        if seen.insert(alert.id.clone()) {
                            merged.push(alert);
                        }
                    }
                }
                Err(e) => warn!(error = %e, "Viewport sample query failed"),
            }
        }

        debug!(alerts = merged.len(), view = %key, "Viewport sampled");
        if let Some(view) = self.views.lock().await.get_mut(&key) {
            view.alerts = merged.clone();
        }
        merged
    }

    /// Number of views currently inside their throttle window.
    pub async fn tracked_views(&self) -> usize {
        self.views.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::ManualClock;
    use alerts_common::{AlertResult, BoundingBox};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct PointSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AlertSource for PointSource {
        async fn active_alerts(&self) -> AlertResult<Vec<Alert>> {
            Ok(Vec::new())
        }

        async fn alerts_at_point(&self, lat: f64, _lon: f64) -> AlertResult<Vec<Alert>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Northern points see an extra alert.
            let mut ids = vec!["shared"];
            if lat > 40.5 {
                ids.push("north");
            }
            Ok(ids
                .into_iter()
                .map(|id| {
                    Alert::from_feature(json!({
                        "id": id, "type": "Feature", "geometry": null, "properties": {}
                    }))
                    .unwrap()
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_sample_merges_and_throttles() {
        let source = Arc::new(PointSource {
            calls: AtomicUsize::new(0),
        });
        let clock = Arc::new(ManualClock::new());
        let sampler =
            ViewportSampler::new(source.clone(), clock.clone(), DEFAULT_SAMPLE_THROTTLE);
        let viewport = Viewport::new(BoundingBox::new(-75.0, 40.0, -74.0, 41.0), 8);

        let mut ids: Vec<String> = sampler
            .sample(&viewport)
            .await
            .into_iter()
            .map(|a| a.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["north", "shared"]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 5);

        clock.advance(Duration::from_millis(300));
        let again = sampler.sample(&viewport).await;
        assert_eq!(again.len(), 2);
        assert_eq!(source.calls.load(Ordering::SeqCst), 5);

        clock.advance(Duration::from_secs(2));
        sampler.sample(&viewport).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_throttle_is_per_viewport() {
        let source = Arc::new(PointSource {
            calls: AtomicUsize::new(0),
        });
        let clock = Arc::new(ManualClock::new());
        let sampler =
            ViewportSampler::new(source.clone(), clock.clone(), DEFAULT_SAMPLE_THROTTLE);

        let new_york = Viewport::new(BoundingBox::new(-74.3, 40.5, -73.7, 40.9), 9);
        let texas = Viewport::new(BoundingBox::new(-97.9, 30.1, -97.5, 30.5), 9);

        let ny: Vec<String> = sampler.sample(&new_york).await.into_iter().map(|a| a.id).collect();
        assert!(ny.contains(&"north".to_string()));

        clock.advance(Duration::from_millis(300));
        let tx: Vec<String> = sampler.sample(&texas).await.into_iter().map(|a| a.id).collect();
        assert_eq!(tx, vec!["shared"]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 10);
        assert_eq!(sampler.tracked_views().await, 2);

        // Each view keeps its own samples inside the window.
        clock.advance(Duration::from_millis(300));
        let ny_again: Vec<String> =
            sampler.sample(&new_york).await.into_iter().map(|a| a.id).collect();
        assert_eq!(ny_again, ny);
        assert_eq!(source.calls.load(Ordering::SeqCst), 10);

        // Once the windows pass, stale views are dropped.
        clock.advance(Duration::from_secs(5));
        sampler.sample(&texas).await;
        assert_eq!(sampler.tracked_views().await, 1);
    }
}
