//! Sidebar list, latest, recently added and manual refresh.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    response::Json,
};
use serde::{Deserialize, Serialize};

use alerts_common::Alert;
use alerts_pipeline::{latest, AlertFilter, RecentAlert, RefreshOutcome, SidebarSummary};

use crate::error::ApiResult;
use crate::state::AppState;

/// Alerts returned by `/alerts/latest` when `max` is omitted.
pub const DEFAULT_LATEST_MAX: usize = 6;

#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub q: Option<String>,
    /// Comma-separated kinds, e.g. `warning,watch`.
    pub kinds: Option<String>,
    pub severity: Option<String>,
}

impl FilterQuery {
    pub fn to_filter(&self) -> ApiResult<AlertFilter> {
        Ok(AlertFilter::from_params(
            self.q.as_deref(),
            self.kinds.as_deref(),
            self.severity.as_deref(),
        )?)
    }
}

#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    pub max: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LatestResponse {
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Serialize)]
pub struct RecentResponse {
    pub recent: Vec<RecentAlert>,
}

/// GET /alerts - Filtered alert list with severity counts
pub async fn list_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<FilterQuery>,
) -> ApiResult<Json<SidebarSummary>> {
    let filter = params.to_filter()?;
    let alerts = state.store.snapshot().await;
    Ok(Json(SidebarSummary::build(&alerts, &filter)))
}

/// GET /alerts/latest - Newest alerts by send time
pub async fn latest_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<LatestQuery>,
) -> Json<LatestResponse> {
    let alerts = state.store.snapshot().await;
    let max = params.max.unwrap_or(DEFAULT_LATEST_MAX);
    Json(LatestResponse {
        alerts: latest(&alerts, max).into_iter().cloned().collect(),
    })
}

/// GET /alerts/recent - Alerts first seen during this session
pub async fn recent_handler(Extension(state): Extension<Arc<AppState>>) -> Json<RecentResponse> {
    Json(RecentResponse {
        recent: state.store.recent().await,
    })
}

/// POST /refresh - Refresh the feed now
pub async fn refresh_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<Json<RefreshOutcome>> {
    Ok(Json(state.refresh().await?))
}
