//! Sidebar filtering over the full alert set.
//!
//! The sidebar always works on every active alert, never on the subset
//! that happens to be drawn.

use serde::Serialize;
use std::collections::HashMap;

use alerts_common::{Alert, AlertError, AlertKind, AlertResult, Severity};

/// Search text, enabled kinds and an optional severity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertFilter {
    query: String,
    /// Kinds absent from the map are enabled.
    kinds: HashMap<AlertKind, bool>,
    severity: Option<Severity>,
}

impl AlertFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Search text is trimmed and matched case-insensitively.
    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.trim().to_lowercase();
        self
    }

    /// Enable exactly the given kinds.
    pub fn with_kinds<I: IntoIterator<Item = AlertKind>>(mut self, kinds: I) -> Self {
        self.kinds = AlertKind::ALL.into_iter().map(|k| (k, false)).collect();
        for kind in kinds {
            self.kinds.insert(kind, true);
        }
        self
    }

    pub fn set_kind(&mut self, kind: AlertKind, enabled: bool) {
        self.kinds.insert(kind, enabled);
    }

    pub fn with_severity(mut self, severity: Option<Severity>) -> Self {
        self.severity = severity;
        self
    }

    /// Build from HTTP query values: `q`, comma-separated `kinds`, `severity`.
    ///
    /// An empty or `any` severity means no severity filter. Unrecognized
    /// kinds or severities are rejected.
    pub fn from_params(
        q: Option<&str>,
        kinds: Option<&str>,
        severity: Option<&str>,
    ) -> AlertResult<Self> {
        let mut filter = AlertFilter::new().with_query(q.unwrap_or_default());

        if let Some(kinds) = kinds.filter(|k| !k.trim().is_empty()) {
            let parsed = kinds
                .split(',')
                .map(|name| {
                    AlertKind::parse(name).ok_or_else(|| AlertError::InvalidParameter {
                        param: "kinds".to_string(),
                        message: format!("unknown kind '{}'", name.trim()),
                    })
                })
                .collect::<AlertResult<Vec<_>>>()?;
            filter = filter.with_kinds(parsed);
        }

        if let Some(sev) = severity.map(str::trim) {
            if !sev.is_empty() && !sev.eq_ignore_ascii_case("any") {
                let parsed = Severity::ALL
                    .into_iter()
                    .find(|s| s.as_str().eq_ignore_ascii_case(sev))
                    .ok_or_else(|| AlertError::InvalidParameter {
                        param: "severity".to_string(),
                        message: format!("unknown severity '{}'", sev),
                    })?;
                filter = filter.with_severity(Some(parsed));
            }
        }

        Ok(filter)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn has_query(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn kind_enabled(&self, kind: AlertKind) -> bool {
        self.kinds.get(&kind).copied().unwrap_or(true)
    }

    pub fn matches_query(&self, alert: &Alert) -> bool {
        !self.has_query() || alert.search_blob().contains(&self.query)
    }

    pub fn matches(&self, alert: &Alert) -> bool {
        self.kind_enabled(alert.kind())
            && self.severity.map_or(true, |s| alert.severity == s)
            && self.matches_query(alert)
    }

    pub fn apply<'a>(&self, alerts: &'a [Alert]) -> Vec<&'a Alert> {
        alerts.iter().filter(|a| self.matches(a)).collect()
    }
}

/// Alert counts per severity tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub extreme: usize,
    pub severe: usize,
    pub moderate: usize,
    pub minor: usize,
    pub unknown: usize,
}

impl SeverityCounts {
    pub fn from_alerts<'a, I: IntoIterator<Item = &'a Alert>>(alerts: I) -> Self {
        let mut counts = Self::default();
        for alert in alerts {
            match alert.severity {
                Severity::Extreme => counts.extreme += 1,
                Severity::Severe => counts.severe += 1,
                Severity::Moderate => counts.moderate += 1,
                Severity::Minor => counts.minor += 1,
                Severity::Unknown => counts.unknown += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.extreme + self.severe + self.moderate + self.minor + self.unknown
    }
}

/// What the sidebar shows for one filter.
#[derive(Debug, Clone, Serialize)]
pub struct SidebarSummary {
    pub total: usize,
    pub shown_count: usize,
    pub counts: SeverityCounts,
    pub alerts: Vec<Alert>,
}

impl SidebarSummary {
    pub fn build(alerts: &[Alert], filter: &AlertFilter) -> Self {
        let shown = filter.apply(alerts);
        Self {
            total: alerts.len(),
            shown_count: shown.len(),
            counts: SeverityCounts::from_alerts(shown.iter().copied()),
            alerts: shown.into_iter().cloned().collect(),
        }
    }
}

/// The `max` most recently sent alerts; alerts without `sent` go last.
pub fn latest(alerts: &[Alert], max: usize) -> Vec<&Alert> {
    let mut sorted: Vec<&Alert> = alerts.iter().collect();
    sorted.sort_by(|a, b| b.sent.cmp(&a.sent));
    sorted.truncate(max);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn alert(id: &str, event: &str, severity: &str, area: &str) -> Alert {
        Alert::from_feature(json!({
            "id": id,
            "type": "Feature",
            "geometry": null,
            "properties": { "event": event, "severity": severity, "areaDesc": area }
        }))
        .unwrap()
    }

    #[test]
    fn test_default_filter_shows_everything() {
        let alerts = vec![
            alert("a", "Tornado Warning", "Extreme", "Kent"),
            alert("b", "Air Quality Alert", "Bogus", "Essex"),
        ];
        let summary = SidebarSummary::build(&alerts, &AlertFilter::new());
        assert_eq!(summary.shown_count, 2);
        assert_eq!(summary.counts.extreme, 1);
        assert_eq!(summary.counts.unknown, 1);
    }

    #[test]
    fn test_search_and_kinds() {
        let alerts = vec![
            alert("a", "Tornado Warning", "Extreme", "Kent County"),
            alert("b", "Flood Watch", "Moderate", "Kent County"),
            alert("c", "Flood Warning", "Severe", "Essex"),
        ];

        let filter = AlertFilter::new().with_query("  KENT ");
        let ids: Vec<_> = filter.apply(&alerts).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let filter = AlertFilter::new().with_kinds([AlertKind::Warning]);
        let ids: Vec<_> = filter.apply(&alerts).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_missing_kind_counts_as_enabled() {
        let mut filter = AlertFilter::new();
        filter.set_kind(AlertKind::Watch, false);
        assert!(filter.kind_enabled(AlertKind::Other));
        assert!(!filter.kind_enabled(AlertKind::Watch));
    }

    #[test]
    fn test_from_params() {
        let filter =
            AlertFilter::from_params(Some("flood"), Some("warning,watch"), Some("any")).unwrap();
        assert!(filter.kind_enabled(AlertKind::Watch));
        assert!(!filter.kind_enabled(AlertKind::Advisory));
        assert_eq!(filter.query(), "flood");

        assert!(AlertFilter::from_params(None, Some("warning,bogus"), None).is_err());

        let filter = AlertFilter::from_params(None, None, Some("severe")).unwrap();
        assert!(!filter.matches(&alert("a", "Flood Warning", "Minor", "")));
        assert!(filter.matches(&alert("b", "Flood Warning", "Severe", "")));
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let err = AlertFilter::from_params(None, None, Some("catastrophic")).unwrap_err();
        assert!(matches!(
            err,
            AlertError::InvalidParameter { ref param, .. } if param == "severity"
        ));

        assert!(AlertFilter::from_params(None, None, Some("")).is_ok());
        assert!(AlertFilter::from_params(None, None, Some(" ANY ")).is_ok());

        let filter = AlertFilter::from_params(None, None, Some("unknown")).unwrap();
        assert!(filter.matches(&alert("u", "Special Statement", "", "")));
        assert!(!filter.matches(&alert("m", "Special Statement", "Minor", "")));
    }

    #[test]
    fn test_latest_orders_by_sent() {
        let mut a = alert("a", "Wind Advisory", "Minor", "");
        let mut b = alert("b", "Wind Advisory", "Minor", "");
        let c = alert("c", "Wind Advisory", "Minor", "");
        a.sent = Some(Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap());
        b.sent = Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        let alerts = vec![a, b, c];

        let ids: Vec<_> = latest(&alerts, 2).iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
