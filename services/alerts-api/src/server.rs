//! Router construction and server startup.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::handlers::{alerts, draw, health};
use crate::state::AppState;

/// Every route except `/metrics`, which needs the recorder handle.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health and status
        .route("/health", get(health::health_handler))
        .route("/status", get(health::status_handler))
        // Sidebar
        .route("/alerts", get(alerts::list_handler))
        .route("/alerts/latest", get(alerts::latest_handler))
        .route("/alerts/recent", get(alerts::recent_handler))
        .route("/refresh", post(alerts::refresh_handler))
        // Map
        .route("/alerts/draw", get(draw::draw_handler))
        .route("/alerts/overlay", get(draw::overlay_handler))
        .route("/alerts/inspect", get(draw::inspect_handler))
        .route("/alerts/:id/focus", get(draw::focus_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

pub async fn run_server(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    info!(%addr, "Alerts API listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
