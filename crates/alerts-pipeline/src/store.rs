//! Current alert set, replaced wholesale on every refresh.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

use alerts_common::{Alert, Severity};

/// Entries kept in the recently-added list.
pub const RECENT_MAX: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Info,
    Ok,
    Warn,
    Bad,
}

/// One-line status shown next to the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Short record of an alert first seen during this session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentAlert {
    pub id: String,
    pub event: String,
    pub sent: Option<DateTime<Utc>>,
    pub severity: Severity,
}

/// Result of replacing the alert set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshOutcome {
    pub total: usize,
    /// Ids not present in the previous set. Always empty on the first load.
    pub new_ids: Vec<String>,
    pub first_load: bool,
}

struct StoreInner {
    alerts: Arc<Vec<Alert>>,
    current_ids: HashSet<String>,
    seen_ids: HashSet<String>,
    recent: VecDeque<RecentAlert>,
    loaded: bool,
    status: StatusLine,
    last_refresh: Option<DateTime<Utc>>,
    refresh_count: u64,
}

/// Shared alert state for the service.
pub struct AlertStore {
    inner: RwLock<StoreInner>,
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                alerts: Arc::new(Vec::new()),
                current_ids: HashSet::new(),
                seen_ids: HashSet::new(),
                recent: VecDeque::with_capacity(RECENT_MAX),
                loaded: false,
                status: StatusLine {
                    kind: StatusKind::Info,
                    text: "Booting".to_string(),
                    at: Utc::now(),
                },
                last_refresh: None,
                refresh_count: 0,
            }),
        }
    }

    /// Swap in a fresh alert set.
    pub async fn replace(&self, alerts: Vec<Alert>, now: DateTime<Utc>) -> RefreshOutcome {
        let mut inner = self.inner.write().await;
        let first_load = !inner.loaded;

        let new_ids: Vec<String> = if first_load {
            Vec::new()
        } else {
            alerts
                .iter()
                .filter(|a| !inner.current_ids.contains(&a.id))
                .map(|a| a.id.clone())
                .collect()
        };

        for alert in &alerts {
            if inner.seen_ids.insert(alert.id.clone()) {
                inner.recent.push_front(RecentAlert {
                    id: alert.id.clone(),
                    event: alert.event.clone(),
                    sent: alert.sent,
                    severity: alert.severity,
                });
                inner.recent.truncate(RECENT_MAX);
            }
        }

        let total = alerts.len();
        inner.current_ids = alerts.iter().map(|a| a.id.clone()).collect();

        // Only ids still in the feed or on the recent list are remembered.
        let StoreInner {
            seen_ids,
            current_ids,
            recent,
            ..
        } = &mut *inner;
        seen_ids.retain(|id| current_ids.contains(id) || recent.iter().any(|r| &r.id == id));
        inner.alerts = Arc::new(alerts);
        inner.loaded = true;
        inner.last_refresh = Some(now);
        inner.refresh_count += 1;
        inner.status = StatusLine {
            kind: if total > 0 { StatusKind::Warn } else { StatusKind::Ok },
            text: format!("Ready • {} alerts", total),
            at: now,
        };

        RefreshOutcome {
            total,
            new_ids,
            first_load,
        }
    }

    /// Record a failed refresh. The previous alert set stays in place.
    pub async fn record_failure(&self, message: &str, now: DateTime<Utc>) {
        let mut inner = self.inner.write().await;
        inner.status = StatusLine {
            kind: StatusKind::Bad,
            text: format!("Alert refresh failed: {}", message),
            at: now,
        };
    }

    pub async fn set_status(&self, kind: StatusKind, text: impl Into<String>) {
        let mut inner = self.inner.write().await;
        inner.status = StatusLine {
            kind,
            text: text.into(),
            at: Utc::now(),
        };
    }

    /// Cheap handle to the current alert set.
    pub async fn snapshot(&self) -> Arc<Vec<Alert>> {
        self.inner.read().await.alerts.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Alert> {
        let inner = self.inner.read().await;
        inner.alerts.iter().find(|a| a.id == id).cloned()
    }

    /// Recently first-seen alerts, newest first.
    pub async fn recent(&self) -> Vec<RecentAlert> {
        self.inner.read().await.recent.iter().cloned().collect()
    }

    pub async fn status(&self) -> StatusLine {
        self.inner.read().await.status.clone()
    }

    pub async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.last_refresh
    }

    pub async fn refresh_count(&self) -> u64 {
        self.inner.read().await.refresh_count
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.alerts.len()
    }

    pub async fn is_loaded(&self) -> bool {
        self.inner.read().await.loaded
    }
}
