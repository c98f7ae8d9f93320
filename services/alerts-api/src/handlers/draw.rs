//! Map handlers: viewport draw set, zone overlay, point inspect and focus.
//!
//! Every request rebuilds the shapes for its own view through the shared
//! caches, renders them onto a [`GeoJsonSurface`] and answers from there.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use alerts_common::{Alert, AlertError, BoundingBox};
use alerts_geometry::Viewport;
use alerts_pipeline::{BuildReport, DrawOutcome, DrawRequest, FocusTarget};
use alerts_renderer::{AlertsLayer, GeoJsonSurface, PopupContent};

use crate::error::ApiResult;
use crate::handlers::alerts::FilterQuery;
use crate::state::AppState;

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DrawQuery {
    /// `west,south,east,north`
    pub bbox: String,
    pub zoom: u8,
    pub q: Option<String>,
    pub kinds: Option<String>,
    pub severity: Option<String>,
    /// Lower zone caps. Defaults to the service setting.
    pub perf: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct OverlayQuery {
    pub bbox: Option<String>,
    pub zoom: Option<u8>,
    pub q: Option<String>,
    pub kinds: Option<String>,
    pub severity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InspectQuery {
    pub lat: f64,
    pub lon: f64,
    pub bbox: String,
    pub zoom: u8,
    pub q: Option<String>,
    pub kinds: Option<String>,
    pub severity: Option<String>,
    pub perf: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct FocusQuery {
    pub bbox: String,
    pub zoom: u8,
    /// View size in pixels, used to pick the focus zoom.
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub q: Option<String>,
    pub kinds: Option<String>,
    pub severity: Option<String>,
    pub perf: Option<bool>,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DrawResponse {
    /// Styled FeatureCollection.
    pub geojson: Value,
    pub features: usize,
    pub searching: bool,
    pub boosted_added: usize,
    pub base: BuildReport,
    pub boost: Option<BuildReport>,
}

#[derive(Debug, Serialize)]
pub struct OverlayResponse {
    pub geojson: Value,
    pub native: usize,
    pub zones: usize,
    pub zones_requested: usize,
    pub zones_unavailable: usize,
}

#[derive(Debug, Serialize)]
pub struct InspectResponse {
    pub lat: f64,
    pub lon: f64,
    pub alert_ids: Vec<String>,
    pub alerts: Vec<PopupContent>,
}

#[derive(Debug, Serialize)]
pub struct FocusResponse {
    /// `None` when the alert has no drawable shape at all.
    pub target: Option<FocusTarget>,
    pub popup: PopupContent,
    /// `(lon, lat)` the popup is anchored at.
    pub popup_at: (f64, f64),
}

// ============================================================================
// Helpers
// ============================================================================

fn filter_query(
    q: &Option<String>,
    kinds: &Option<String>,
    severity: &Option<String>,
) -> FilterQuery {
    FilterQuery {
        q: q.clone(),
        kinds: kinds.clone(),
        severity: severity.clone(),
    }
}

/// Run the base and boost passes for one view.
async fn draw_view(
    state: &AppState,
    viewport: Viewport,
    filter: FilterQuery,
    perf: Option<bool>,
) -> ApiResult<(Arc<Vec<Alert>>, DrawOutcome)> {
    let request = DrawRequest {
        viewport,
        filter: filter.to_filter()?,
        performance: perf.unwrap_or(state.config.performance),
    };
    let alerts = state.store.snapshot().await;
    let outcome = state.updater.update(&alerts, &request).await;
    Ok((alerts, outcome))
}

fn layer_for(
    state: &AppState,
    viewport: &Viewport,
    size: (f64, f64),
) -> AlertsLayer<GeoJsonSurface> {
    AlertsLayer::with_palette(
        GeoJsonSurface::new(viewport.bounds, viewport.zoom, size),
        state.config.style.clone(),
    )
}

fn default_size(state: &AppState) -> (f64, f64) {
    (state.config.view_width_px, state.config.view_height_px)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /alerts/draw - Styled shapes for a viewport
pub async fn draw_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<DrawQuery>,
) -> ApiResult<Json<DrawResponse>> {
    let viewport = Viewport::from_query(&params.bbox, params.zoom)?;
    let filter = filter_query(&params.q, &params.kinds, &params.severity);
    let (_, outcome) = draw_view(&state, viewport, filter, params.perf).await?;

    let mut layer = layer_for(&state, &viewport, default_size(&state));
    let features = layer.replace(&outcome.features);
    debug!(bbox = %params.bbox, zoom = params.zoom, features, "Viewport drawn");

    Ok(Json(DrawResponse {
        geojson: layer.surface().to_feature_collection(),
        features,
        searching: outcome.searching,
        boosted_added: outcome.boosted_added,
        base: outcome.base,
        boost: outcome.boost,
    }))
}

/// GET /alerts/overlay - One shape per zone, shared by every alert naming it
pub async fn overlay_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<OverlayQuery>,
) -> ApiResult<Json<OverlayResponse>> {
    let viewport = match (&params.bbox, params.zoom) {
        (Some(bbox), Some(zoom)) => Some(Viewport::from_query(bbox, zoom)?),
        (Some(_), None) => return Err(AlertError::MissingParameter("zoom".to_string()).into()),
        (None, _) => None,
    };

    let filter = filter_query(&params.q, &params.kinds, &params.severity).to_filter()?;
    let snapshot = state.store.snapshot().await;
    let alerts: Vec<Alert> = filter.apply(&snapshot).into_iter().cloned().collect();

    let set = state
        .overlay
        .build(&alerts, viewport.as_ref(), state.config.updater.viewport_pad)
        .await;

    let view = viewport.unwrap_or_else(|| {
        let bounds = set
            .native
            .iter()
            .map(|f| f.bbox)
            .chain(set.zones.iter().map(|z| z.bbox))
            .reduce(|a, b| a.union(&b))
            .unwrap_or_else(|| BoundingBox::new(-180.0, -85.0, 180.0, 85.0));
        Viewport::new(bounds, 0)
    });
    let mut layer = layer_for(&state, &view, default_size(&state));
    layer.replace_overlay(&set);

    Ok(Json(OverlayResponse {
        geojson: layer.surface().to_feature_collection(),
        native: set.native.len(),
        zones: set.zones.len(),
        zones_requested: set.zones_requested,
        zones_unavailable: set.zones_unavailable,
    }))
}

/// GET /alerts/inspect - Alerts drawn at a point
pub async fn inspect_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<InspectQuery>,
) -> ApiResult<Json<InspectResponse>> {
    let viewport = Viewport::from_query(&params.bbox, params.zoom)?;
    let filter = filter_query(&params.q, &params.kinds, &params.severity);
    let (alerts, outcome) = draw_view(&state, viewport, filter, params.perf).await?;

    let mut layer = layer_for(&state, &viewport, default_size(&state));
    layer.replace(&outcome.features);
    let alert_ids = layer.alert_ids_at(params.lon, params.lat);

    let popups = alert_ids
        .iter()
        .filter_map(|id| alerts.iter().find(|a| &a.id == id))
        .map(PopupContent::for_alert)
        .collect();

    debug!(hits = alert_ids.len(), "Point inspected");
    Ok(Json(InspectResponse {
        lat: params.lat,
        lon: params.lon,
        alert_ids,
        alerts: popups,
    }))
}

/// GET /alerts/:id/focus - Where to move the map for one alert
pub async fn focus_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<FocusQuery>,
) -> ApiResult<Json<FocusResponse>> {
    let alert = state
        .store
        .get(&id)
        .await
        .ok_or_else(|| AlertError::AlertNotFound(id.clone()))?;

    let viewport = Viewport::from_query(&params.bbox, params.zoom)?;
    let filter = filter_query(&params.q, &params.kinds, &params.severity);
    let (_, outcome) = draw_view(&state, viewport, filter, params.perf).await?;

    let (default_w, default_h) = default_size(&state);
    let size = (
        params.width.unwrap_or(default_w),
        params.height.unwrap_or(default_h),
    );
    let mut layer = layer_for(&state, &viewport, size);
    layer.replace(&outcome.features);

    let target = match layer.focus(&alert) {
        Some(target) => Some(target),
        None => state.updater.locate(&alert, size.0, size.1).await,
    };

    let (popup_at, popup) = match layer.surface().popup() {
        Some(open) => (open.at, open.content.clone()),
        None => (viewport.bounds.center(), PopupContent::for_alert(&alert)),
    };

    Ok(Json(FocusResponse {
        target,
        popup,
        popup_at,
    }))
}
