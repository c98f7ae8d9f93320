//! Mock upstreams that record how often they are called.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alerts_common::{Alert, AlertError, AlertResult};
use alerts_pipeline::{AlertSource, ZoneFetcher};

/// What the mock returns for one zone URL.
#[derive(Debug, Clone)]
pub enum MockZone {
    Body(Value),
    Status(u16),
}

/// In-memory [`ZoneFetcher`]. Unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct MockZoneFetcher {
    zones: HashMap<String, MockZone>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    fetched: Mutex<Vec<String>>,
}

impl MockZoneFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone(mut self, url: impl Into<String>, body: Value) -> Self {
        self.zones.insert(url.into(), MockZone::Body(body));
        self
    }

    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.zones.insert(url.into(), MockZone::Status(status));
        self
    }

    /// Sleep before answering, to exercise concurrency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Total fetch invocations.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.fetched
            .lock()
            .map(|f| f.iter().filter(|u| *u == url).count())
            .unwrap_or(0)
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetched.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ZoneFetcher for MockZoneFetcher {
    async fn fetch(&self, url: &str) -> AlertResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(url.to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.zones.get(url) {
            Some(MockZone::Body(body)) => Ok(body.clone()),
            Some(MockZone::Status(status)) => Err(AlertError::UpstreamStatus {
                status: *status,
                body: String::new(),
            }),
            None => Err(AlertError::UpstreamStatus {
                status: 404,
                body: "zone not found".to_string(),
            }),
        }
    }
}

/// In-memory [`AlertSource`].
///
/// Point queries return every alert whose native geometry bbox contains the
/// point, plus any alerts registered with [`MockAlertSource::with_point_alert`].
#[derive(Debug, Default)]
pub struct MockAlertSource {
    active: Mutex<Vec<Alert>>,
    point_alerts: Vec<Alert>,
    fail_active: Mutex<bool>,
    active_calls: AtomicUsize,
    point_calls: AtomicUsize,
}

impl MockAlertSource {
    pub fn new(active: Vec<Alert>) -> Self {
        Self {
            active: Mutex::new(active),
            ..Default::default()
        }
    }

    /// Returned by every point query.
    pub fn with_point_alert(mut self, alert: Alert) -> Self {
        self.point_alerts.push(alert);
        self
    }

    pub fn set_active(&self, alerts: Vec<Alert>) {
        if let Ok(mut active) = self.active.lock() {
            *active = alerts;
        }
    }

    /// Make `active_alerts` fail until reset.
    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut fail) = self.fail_active.lock() {
            *fail = failing;
        }
    }

    pub fn active_calls(&self) -> usize {
        self.active_calls.load(Ordering::SeqCst)
    }

    pub fn point_calls(&self) -> usize {
        self.point_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlertSource for MockAlertSource {
    async fn active_alerts(&self) -> AlertResult<Vec<Alert>> {
        self.active_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_active.lock().map(|f| *f).unwrap_or(false) {
            return Err(AlertError::UpstreamStatus {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        Ok(self.active.lock().map(|a| a.clone()).unwrap_or_default())
    }

    async fn alerts_at_point(&self, lat: f64, lon: f64) -> AlertResult<Vec<Alert>> {
        self.point_calls.fetch_add(1, Ordering::SeqCst);
        let mut out: Vec<Alert> = self
            .active
            .lock()
            .map(|active| {
                active
                    .iter()
                    .filter(|a| {
                        a.geometry
                            .as_ref()
                            .and_then(|g| g.bbox())
                            .is_some_and(|b| b.contains_point(lon, lat))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        out.extend(self.point_alerts.iter().cloned());
        Ok(out)
    }
}
