//! Deduplicated zone overlay.

use std::sync::Arc;
use std::time::Duration;

use alerts_cache::{LruSimplificationCache, MemoryZoneCache};
use alerts_common::{BoundingBox, Severity};
use alerts_geometry::Viewport;
use alerts_pipeline::{DrawFeatureBuilder, ZoneOverlayBuilder, ZoneResolver};
use test_utils::{bbox, square_zone_feature, zone_url, AlertBuilder, MockZoneFetcher};

const INSIDE: (f64, f64, f64, f64) = (-74.8, 40.2, -74.6, 40.4);
const INSIDE_2: (f64, f64, f64, f64) = (-74.4, 40.2, -74.2, 40.4);

fn overlay_builder(fetcher: Arc<MockZoneFetcher>) -> ZoneOverlayBuilder {
    let resolver = Arc::new(ZoneResolver::new(fetcher, Arc::new(MemoryZoneCache::new())));
    let builder = Arc::new(DrawFeatureBuilder::new(
        resolver,
        Arc::new(LruSimplificationCache::default()),
    ));
    ZoneOverlayBuilder::new(builder)
}

fn shared_zone_fetcher() -> MockZoneFetcher {
    MockZoneFetcher::new()
        .with_zone(zone_url("NJZ001"), square_zone_feature("NJZ001", INSIDE))
        .with_zone(zone_url("NJZ002"), square_zone_feature("NJZ002", INSIDE_2))
        .with_zone(zone_url("WAZ001"), square_zone_feature("WAZ001", bbox::PACIFIC_NW))
}

#[tokio::test]
async fn test_shared_zone_drawn_once_with_all_alert_ids() {
    let fetcher = Arc::new(shared_zone_fetcher());
    let overlay = overlay_builder(fetcher.clone());
    let alerts = vec![
        AlertBuilder::new("A1")
            .severity("Minor")
            .zones(&["NJZ001", "NJZ002"])
            .build(),
        AlertBuilder::new("A2")
            .severity("Severe")
            .zones(&["NJZ001"])
            .build(),
    ];

    let set = overlay.build(&alerts, None, 0.0).await;

    assert_eq!(set.zones_requested, 2);
    assert_eq!(set.zones.len(), 2);
    assert_eq!(fetcher.calls(), 2);

    let shared = &set.zones[0];
    assert_eq!(shared.zone_url, zone_url("NJZ001"));
    assert_eq!(shared.alert_ids, vec!["A1".to_string(), "A2".to_string()]);
    assert_eq!(shared.severity, Severity::Severe);

    let single = &set.zones[1];
    assert_eq!(single.alert_ids, vec!["A1".to_string()]);
    assert_eq!(single.severity, Severity::Minor);
}

#[tokio::test]
async fn test_native_alerts_listed_separately() {
    let overlay = overlay_builder(Arc::new(shared_zone_fetcher()));
    let alerts = vec![
        AlertBuilder::new("N1").square(INSIDE_2).build(),
        AlertBuilder::new("Z1").zones(&["NJZ001"]).build(),
        AlertBuilder::new("bare").build(),
    ];

    let set = overlay.build(&alerts, None, 0.0).await;

    assert_eq!(set.native.len(), 1);
    assert_eq!(set.native[0].id, "N1");
    assert_eq!(set.zones.len(), 1);
    assert_eq!(set.zones[0].alert_ids, vec!["Z1".to_string()]);
}

#[tokio::test]
async fn test_unavailable_zones_are_counted() {
    let fetcher = MockZoneFetcher::new()
        .with_zone(zone_url("NJZ001"), square_zone_feature("NJZ001", INSIDE))
        .with_status(zone_url("NJZ009"), 503);
    let overlay = overlay_builder(Arc::new(fetcher));
    let alerts = vec![AlertBuilder::new("A1")
        .zones(&["NJZ001", "NJZ009", "NJZ404"])
        .build()];

    let set = overlay.build(&alerts, None, 0.0).await;

    assert_eq!(set.zones_requested, 3);
    assert_eq!(set.zones_unavailable, 2);
    assert_eq!(set.zones.len(), 1);
}

#[tokio::test]
async fn test_viewport_limits_overlay() {
    let overlay = overlay_builder(Arc::new(shared_zone_fetcher()));
    let alerts = vec![AlertBuilder::new("A1")
        .zones(&["NJZ001", "WAZ001"])
        .build()];
    let (w, s, e, n) = bbox::NYC_METRO;
    let viewport = Viewport::new(BoundingBox::new(w, s, e, n), 9);

    let set = overlay.build(&alerts, Some(&viewport), 0.55).await;
    assert_eq!(set.zones.len(), 1);
    assert_eq!(set.zones[0].zone_url, zone_url("NJZ001"));

    let everything = overlay.build(&alerts, None, 0.55).await;
    assert_eq!(everything.zones.len(), 2);
}

#[tokio::test]
async fn test_bounded_concurrency_resolves_everything() {
    let ids: Vec<String> = (0..25).map(|i| format!("NJZ3{:02}", i)).collect();
    let mut fetcher = MockZoneFetcher::new().with_delay(Duration::from_millis(5));
    for id in &ids {
        fetcher = fetcher.with_zone(zone_url(id), square_zone_feature(id, INSIDE));
    }
    let fetcher = Arc::new(fetcher);
    let overlay = overlay_builder(fetcher.clone()).with_concurrency(4);
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let alerts = vec![AlertBuilder::new("A1").zones(&refs).build()];

    let set = overlay.build(&alerts, None, 0.0).await;

    assert_eq!(fetcher.calls(), 25);
    assert_eq!(set.zones.len(), 25);
    // Output keeps first-seen order regardless of completion order.
    let urls: Vec<String> = set.zones.iter().map(|z| z.zone_url.clone()).collect();
    let expected: Vec<String> = ids.iter().map(|id| zone_url(id)).collect();
    assert_eq!(urls, expected);
}
