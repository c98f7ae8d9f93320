//! Router tests against mock upstreams.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use alerts_api::config::WarmViewport;
use alerts_api::{create_router, AppState, Refresher, ServiceConfig};
use alerts_common::Alert;
use alerts_pipeline::ManualClock;
use test_utils::{
    bbox, square_zone_feature, zone_url, AlertBuilder, MockAlertSource, MockZoneFetcher,
};

const NJ_VIEW: &str = "-76,39,-73,42";

struct Harness {
    state: Arc<AppState>,
    source: Arc<MockAlertSource>,
    fetcher: Arc<MockZoneFetcher>,
    clock: Arc<ManualClock>,
}

fn seed_alerts() -> Vec<Alert> {
    vec![
        AlertBuilder::new("A1")
            .event("Flood Warning")
            .severity("Severe")
            .headline("Flood Warning for Mercer County")
            .sent("2024-05-01T12:00:00Z")
            .square(bbox::UNIT_SQUARE_NJ)
            .build(),
        AlertBuilder::new("Z1")
            .event("Wind Advisory")
            .severity("Moderate")
            .sent("2024-05-01T13:00:00Z")
            .zones(&["NJZ001"])
            .build(),
        AlertBuilder::new("Z2")
            .event("Frost Advisory")
            .severity("Minor")
            .sent("2024-05-01T11:00:00Z")
            .zones(&["NJZ001", "WAZ001"])
            .build(),
    ]
}

fn harness_with(config: ServiceConfig) -> Harness {
    let source = Arc::new(MockAlertSource::new(seed_alerts()));
    let fetcher = Arc::new(
        MockZoneFetcher::new()
            .with_zone(
                zone_url("NJZ001"),
                square_zone_feature("NJZ001", (-74.8, 40.2, -74.4, 40.6)),
            )
            .with_zone(
                zone_url("WAZ001"),
                square_zone_feature("WAZ001", bbox::PACIFIC_NW),
            ),
    );
    let clock = Arc::new(ManualClock::new());
    let state = Arc::new(AppState::with_parts(
        config,
        source.clone(),
        fetcher.clone(),
        clock.clone(),
    ));
    Harness {
        state,
        source,
        fetcher,
        clock,
    }
}

async fn loaded_harness() -> Harness {
    let config = ServiceConfig {
        sample_viewport: false,
        ..Default::default()
    };
    let h = harness_with(config);
    h.state.refresh().await.unwrap();
    h
}

fn router(h: &Harness) -> Router {
    create_router(h.state.clone())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn alert_ids_of(geojson: &Value) -> Vec<String> {
    geojson["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["properties"]["alertId"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Health and status
// ============================================================================

#[tokio::test]
async fn test_health() {
    let h = loaded_harness().await;
    let (status, body) = get_json(router(&h), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_status_after_refresh() {
    let h = loaded_harness().await;
    let (status, body) = get_json(router(&h), "/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loaded"], true);
    assert_eq!(body["alerts"], 3);
    assert_eq!(body["refresh_count"], 1);
    assert_eq!(body["counts"]["severe"], 1);
    assert_eq!(body["caches"]["zone_entries"], 0);
}

#[tokio::test]
async fn test_failed_refresh_keeps_alerts() {
    let h = loaded_harness().await;
    h.source.set_failing(true);

    let (status, body) = post_json(router(&h), "/refresh").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], 502);

    let (_, body) = get_json(router(&h), "/status").await;
    assert_eq!(body["alerts"], 3);
    assert_eq!(body["status"]["kind"], "bad");
}

#[tokio::test]
async fn test_manual_refresh_reports_new_ids() {
    let h = loaded_harness().await;
    let mut alerts = seed_alerts();
    alerts.push(AlertBuilder::new("N1").event("Heat Advisory").build());
    h.source.set_active(alerts);

    let (status, body) = post_json(router(&h), "/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["first_load"], false);
    assert_eq!(body["new_ids"], serde_json::json!(["N1"]));
    assert_eq!(body["total"], 4);
}

// ============================================================================
// Sidebar
// ============================================================================

#[tokio::test]
async fn test_list_filters_by_severity() {
    let h = loaded_harness().await;
    let (status, body) = get_json(router(&h), "/alerts?severity=Severe").await;

    assert_eq!(status, StatusCode::OK);
    let alerts = body["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["id"], "A1");
}

#[tokio::test]
async fn test_list_rejects_unknown_kind() {
    let h = loaded_harness().await;
    let (status, body) = get_json(router(&h), "/alerts?kinds=bogus").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_list_rejects_unknown_severity() {
    let h = loaded_harness().await;
    let (status, body) = get_json(router(&h), "/alerts?severity=Catastrophic").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let (status, _) = get_json(router(&h), "/alerts?severity=any").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_latest_orders_by_sent() {
    let h = loaded_harness().await;
    let (_, body) = get_json(router(&h), "/alerts/latest?max=2").await;

    let ids: Vec<&str> = body["alerts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["Z1", "A1"]);
}

// ============================================================================
// Map
// ============================================================================

#[tokio::test]
async fn test_draw_viewport() {
    let h = loaded_harness().await;
    let uri = format!("/alerts/draw?bbox={}&zoom=8", NJ_VIEW);
    let (status, body) = get_json(router(&h), &uri).await;

    assert_eq!(status, StatusCode::OK);
    let mut ids = alert_ids_of(&body["geojson"]);
    ids.sort();
    assert_eq!(ids, vec!["A1", "Z1", "Z2"]);
    assert_eq!(body["features"], 3);
    assert_eq!(body["searching"], false);
    assert_eq!(body["base"]["zones_outside"], 1);
}

#[tokio::test]
async fn test_draw_rejects_bad_bbox() {
    let h = loaded_harness().await;
    let (status, _) = get_json(router(&h), "/alerts/draw?bbox=1,2,3&zoom=8").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_draw_reuses_cached_zones() {
    let h = loaded_harness().await;
    let uri = format!("/alerts/draw?bbox={}&zoom=8", NJ_VIEW);
    get_json(router(&h), &uri).await;
    get_json(router(&h), &uri).await;

    assert_eq!(h.fetcher.calls_for(&zone_url("NJZ001")), 1);
}

#[tokio::test]
async fn test_overlay_shares_zones() {
    let h = loaded_harness().await;
    let (status, body) = get_json(router(&h), "/alerts/overlay").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["native"], 1);
    assert_eq!(body["zones"], 2);
    assert_eq!(body["zones_requested"], 2);
    assert_eq!(body["zones_unavailable"], 0);

    let shared = body["geojson"]["features"]
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["id"] == zone_url("NJZ001"))
        .unwrap()
        .clone();
    assert_eq!(
        shared["properties"]["alertIds"],
        serde_json::json!(["Z1", "Z2"])
    );
}

#[tokio::test]
async fn test_overlay_bbox_requires_zoom() {
    let h = loaded_harness().await;
    let uri = format!("/alerts/overlay?bbox={}", NJ_VIEW);
    let (status, _) = get_json(router(&h), &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inspect_point() {
    let h = loaded_harness().await;
    let uri = format!(
        "/alerts/inspect?lat=40.5&lon=-74.5&bbox={}&zoom=8",
        NJ_VIEW
    );
    let (status, body) = get_json(router(&h), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alert_ids"], serde_json::json!(["A1", "Z1", "Z2"]));
    assert_eq!(body["alerts"][0]["title"], "Flood Warning");
}

#[tokio::test]
async fn test_inspect_point_outside_shapes() {
    let h = loaded_harness().await;
    let uri = format!(
        "/alerts/inspect?lat=40.9&lon=-73.5&bbox={}&zoom=8",
        NJ_VIEW
    );
    let (_, body) = get_json(router(&h), &uri).await;
    assert_eq!(body["alert_ids"], serde_json::json!([]));
}

#[tokio::test]
async fn test_focus_drawn_alert() {
    let h = loaded_harness().await;
    let uri = format!("/alerts/A1/focus?bbox={}&zoom=8", NJ_VIEW);
    let (status, body) = get_json(router(&h), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["target"]["alert_id"], "A1");
    assert_eq!(body["target"]["from_drawn"], true);
    assert_eq!(body["popup"]["alert_id"], "A1");
}

#[tokio::test]
async fn test_focus_locates_undrawn_alert() {
    let h = loaded_harness().await;
    // Severity filter keeps Z2 out of the draw set.
    let uri = format!(
        "/alerts/Z2/focus?bbox={}&zoom=8&severity=Severe",
        NJ_VIEW
    );
    let (status, body) = get_json(router(&h), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["target"]["from_drawn"], false);
    let min_x = body["target"]["bounds"]["min_x"].as_f64().unwrap();
    assert!(min_x < -124.0, "bounds should reach WAZ001, got {}", min_x);
}

#[tokio::test]
async fn test_focus_unknown_alert() {
    let h = loaded_harness().await;
    let uri = format!("/alerts/NOPE/focus?bbox={}&zoom=8", NJ_VIEW);
    let (status, body) = get_json(router(&h), &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

// ============================================================================
// Refresher
// ============================================================================

#[tokio::test]
async fn test_refresher_warms_after_debounce() {
    let config = ServiceConfig {
        sample_viewport: false,
        debounce_ms: 250,
        warm_viewport: Some(WarmViewport {
            bbox: NJ_VIEW.to_string(),
            zoom: 8,
        }),
        ..Default::default()
    };
    let h = harness_with(config);
    let mut refresher = Refresher::new(h.state.clone());

    assert!(refresher.refresh_once().await);
    assert!(!refresher.poll_warm().await);
    assert_eq!(h.fetcher.calls(), 0);

    h.clock.advance(Duration::from_millis(250));
    assert!(refresher.poll_warm().await);
    assert_eq!(h.fetcher.calls_for(&zone_url("NJZ001")), 1);

    // Fired once.
    assert!(!refresher.poll_warm().await);
}

#[tokio::test]
async fn test_refresher_survives_failure() {
    let config = ServiceConfig {
        sample_viewport: false,
        ..Default::default()
    };
    let h = harness_with(config);
    let mut refresher = Refresher::new(h.state.clone());

    assert!(refresher.refresh_once().await);
    h.source.set_failing(true);
    assert!(!refresher.refresh_once().await);
    assert_eq!(h.state.store.len().await, 3);

    // Unchanged feed is not reported as new.
    h.source.set_failing(false);
    assert!(!refresher.refresh_once().await);
}
