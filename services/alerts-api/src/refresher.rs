//! Background feed refresh and zone cache warming.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use alerts_pipeline::{AlertFilter, Debouncer, DrawRequest};

use crate::state::AppState;

/// Refreshes the feed on an interval until shutdown.
///
/// After a refresh that brings in new alerts, a debounced warm-up draw runs
/// for the configured warm viewport so its zones are cached before the
/// first client asks.
pub struct Refresher {
    state: Arc<AppState>,
    interval: Duration,
    warm: Debouncer,
}

impl Refresher {
    pub fn new(state: Arc<AppState>) -> Self {
        let interval = state.config.refresh_interval();
        let warm = Debouncer::new(state.config.debounce());
        Self {
            state,
            interval,
            warm,
        }
    }

    /// One refresh. Returns whether anything new arrived.
    pub async fn refresh_once(&mut self) -> bool {
        match self.state.refresh().await {
            Ok(outcome) => {
                let changed = outcome.first_load || !outcome.new_ids.is_empty();
                if changed && self.state.config.warm_viewport.is_some() {
                    self.warm.trigger(self.state.clock.now());
                }
                changed
            }
            Err(e) => {
                warn!(error = %e, "Scheduled refresh failed, keeping previous alerts");
                false
            }
        }
    }

    /// Run the warm-up draw if its debounce deadline has passed.
    pub async fn poll_warm(&mut self) -> bool {
        if !self.warm.poll(self.state.clock.now()) {
            return false;
        }
        let Some(viewport) = self.state.config.warm_viewport() else {
            return false;
        };

        let alerts = self.state.store.snapshot().await;
        let request = DrawRequest {
            viewport,
            filter: AlertFilter::new(),
            performance: self.state.config.performance,
        };
        let outcome = self.state.updater.update(&alerts, &request).await;
        debug!(
            features = outcome.features.len(),
            zones = outcome.base.zones_considered,
            "Warm viewport drawn"
        );
        true
    }

    pub async fn run_forever(mut self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting alert refresh loop"
        );

        let mut refresh_tick = tokio::time::interval(self.interval);
        let warm_every = self.warm.interval().max(Duration::from_millis(10));
        let mut warm_tick = tokio::time::interval(warm_every);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Shutting down refresh loop");
                    break;
                }
                _ = refresh_tick.tick() => {
                    self.refresh_once().await;
                }
                _ = warm_tick.tick(), if self.warm.is_pending() => {
                    self.poll_warm().await;
                }
            }
        }
    }
}
