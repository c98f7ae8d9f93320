//! NWS alerts API server.
//!
//! Refreshes the active-alerts feed on an interval and serves:
//! - The filtered sidebar list, latest and recently added alerts
//! - Styled alert shapes for a map viewport
//! - Zone overlay, point inspect and alert focus
//! - Status, cache statistics and Prometheus metrics

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{routing::get, Extension, Router};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::sync::broadcast;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use alerts_api::handlers::health::metrics_handler;
use alerts_api::server::{create_router, run_server};
use alerts_api::{AppState, Refresher, ServiceConfig};

#[derive(Parser, Debug)]
#[command(name = "alerts-api")]
#[command(about = "NWS active alerts API with map-ready geometry")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8090", env = "ALERTS_LISTEN_ADDR")]
    listen: String,

    /// YAML configuration file
    #[arg(short, long, env = "ALERTS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Lower zone caps for slow clients
    #[arg(long, env = "ALERTS_PERFORMANCE")]
    performance: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let mut config = ServiceConfig::load(args.config.as_deref())?;
    if args.performance {
        config.performance = true;
    }
    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;

    info!(
        feed = %config.feed.base_url,
        refresh_secs = config.refresh_interval_secs,
        performance = config.performance,
        "Starting alerts API"
    );

    let state = Arc::new(AppState::new(config)?);

    // Shutdown signal
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let refresher = Refresher::new(state.clone());
    let refresh_task = tokio::spawn(refresher.run_forever(shutdown_tx.subscribe()));

    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_tx_clone.send(()).ok();
    });

    let metrics = Router::new()
        .route("/metrics", get(metrics_handler))
        .layer(Extension(prometheus_handle));
    let app = create_router(state).merge(metrics);

    let mut server_shutdown = shutdown_tx.subscribe();
    tokio::select! {
        result = run_server(app, addr) => result?,
        _ = server_shutdown.recv() => {}
    }

    refresh_task.await.ok();
    info!("Alerts API stopped");
    Ok(())
}
