//! Health, status and metrics handlers.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use alerts_pipeline::{SeverityCounts, StatusLine};

use crate::state::{AppState, CacheReport};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub service: String,
    pub status: StatusLine,
    pub loaded: bool,
    pub alerts: usize,
    pub counts: SeverityCounts,
    pub refresh_count: u64,
    pub last_refresh: Option<DateTime<Utc>>,
    pub caches: CacheReport,
    pub performance: bool,
    pub uptime_secs: u64,
}

/// GET /health - Basic health check
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /status - Status line, alert counts and cache statistics
pub async fn status_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    let store = &state.store;
    let alerts = store.snapshot().await;

    Json(StatusResponse {
        service: "alerts-api".to_string(),
        status: store.status().await,
        loaded: store.is_loaded().await,
        alerts: alerts.len(),
        counts: SeverityCounts::from_alerts(alerts.iter()),
        refresh_count: store.refresh_count().await,
        last_refresh: store.last_refresh().await,
        caches: state.cache_report().await,
        performance: state.config.performance,
        uptime_secs: state.uptime_secs(),
    })
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics_handler(Extension(handle): Extension<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
}
