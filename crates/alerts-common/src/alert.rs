//! Normalized NWS alert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AlertError, AlertResult};
use crate::geometry::AlertGeometry;
use crate::severity::Severity;

/// An active alert from the NWS feed, normalized from a GeoJSON Feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    /// Event name, e.g. "Tornado Warning".
    pub event: String,
    pub severity: Severity,
    pub urgency: String,
    pub certainty: String,
    pub headline: String,
    pub description: String,
    pub instruction: String,
    pub area_desc: String,
    pub sent: Option<DateTime<Utc>>,
    pub effective: Option<DateTime<Utc>>,
    pub onset: Option<DateTime<Utc>>,
    pub expires: Option<DateTime<Utc>>,
    pub ends: Option<DateTime<Utc>>,
    pub sender_name: String,
    pub web: String,
    pub status: String,
    pub message_type: String,
    pub category: String,
    pub response: String,
    /// Zone URLs used as geometry fallback.
    pub affected_zones: Vec<String>,
    pub geometry: Option<AlertGeometry>,
}

/// Where an alert's drawable shape comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawSource<'a> {
    Native(&'a AlertGeometry),
    Zones(&'a [String]),
    None,
}

#[derive(Debug, Deserialize)]
struct FeedFeature {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    geometry: Value,
    #[serde(default)]
    properties: FeedProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FeedProperties {
    id: Option<String>,
    event: Option<String>,
    severity: Option<String>,
    urgency: Option<String>,
    certainty: Option<String>,
    headline: Option<String>,
    description: Option<String>,
    instruction: Option<String>,
    area_desc: Option<String>,
    sent: Option<String>,
    effective: Option<String>,
    onset: Option<String>,
    expires: Option<String>,
    ends: Option<String>,
    sender_name: Option<String>,
    web: Option<String>,
    status: Option<String>,
    message_type: Option<String>,
    category: Option<String>,
    response: Option<String>,
    affected_zones: Option<Vec<String>>,
}

fn parse_time(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc))
}

impl Alert {
    /// Normalize one feed Feature.
    ///
    /// A missing id falls back to `properties.id`, then to a random UUID.
    pub fn from_feature(value: Value) -> AlertResult<Self> {
        let feature: FeedFeature = serde_json::from_value(value)?;
        let p = feature.properties;

        let id = feature
            .id
            .or(p.id)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(Self {
            id,
            event: p.event.unwrap_or_else(|| "Alert".to_string()),
            severity: p.severity.map(Severity::from).unwrap_or_default(),
            urgency: p.urgency.unwrap_or_else(|| "Unknown".to_string()),
            certainty: p.certainty.unwrap_or_else(|| "Unknown".to_string()),
            headline: p.headline.unwrap_or_default(),
            description: p.description.unwrap_or_default(),
            instruction: p.instruction.unwrap_or_default(),
            area_desc: p.area_desc.unwrap_or_default(),
            sent: parse_time(p.sent),
            effective: parse_time(p.effective),
            onset: parse_time(p.onset),
            expires: parse_time(p.expires),
            ends: parse_time(p.ends),
            sender_name: p.sender_name.unwrap_or_default(),
            web: p.web.unwrap_or_default(),
            status: p.status.unwrap_or_default(),
            message_type: p.message_type.unwrap_or_default(),
            category: p.category.unwrap_or_default(),
            response: p.response.unwrap_or_default(),
            affected_zones: p.affected_zones.unwrap_or_default(),
            geometry: AlertGeometry::from_value(&feature.geometry),
        })
    }

    /// Normalize every feature of a FeatureCollection.
    ///
    /// Individual malformed features are skipped; a body without a
    /// `features` array is an error.
    pub fn from_feature_collection(value: Value) -> AlertResult<Vec<Self>> {
        let features = match value {
            Value::Object(mut obj) => match obj.remove("features") {
                Some(Value::Array(features)) => features,
                _ => {
                    return Err(AlertError::InvalidFeed(
                        "missing 'features' array".to_string(),
                    ))
                }
            },
            _ => return Err(AlertError::InvalidFeed("expected an object".to_string())),
        };

        Ok(features
            .into_iter()
            .filter_map(|f| Alert::from_feature(f).ok())
            .collect())
    }

    /// Native geometry wins, then a non-empty zone list.
    pub fn draw_source(&self) -> DrawSource<'_> {
        if let Some(geometry) = &self.geometry {
            DrawSource::Native(geometry)
        } else if !self.affected_zones.is_empty() {
            DrawSource::Zones(&self.affected_zones)
        } else {
            DrawSource::None
        }
    }

    pub fn kind(&self) -> AlertKind {
        AlertKind::classify(&self.event)
    }

    /// Lowercased text searched by the sidebar and draw filters.
    pub fn search_blob(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.event, self.headline, self.area_desc, self.description, self.instruction
        )
        .to_lowercase()
    }

    /// Best available start time for display.
    pub fn starts(&self) -> Option<DateTime<Utc>> {
        self.effective.or(self.onset)
    }

    /// Best available end time for display.
    pub fn finishes(&self) -> Option<DateTime<Utc>> {
        self.ends.or(self.expires)
    }
}

/// Product class derived from the event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Warning,
    Watch,
    Advisory,
    Statement,
    Forecast,
    Other,
}

impl AlertKind {
    pub const ALL: [AlertKind; 6] = [
        AlertKind::Warning,
        AlertKind::Watch,
        AlertKind::Advisory,
        AlertKind::Statement,
        AlertKind::Forecast,
        AlertKind::Other,
    ];

    pub fn classify(event: &str) -> Self {
        let e = event.to_lowercase();
        if e.contains("warning") {
            AlertKind::Warning
        } else if e.contains("watch") {
            AlertKind::Watch
        } else if e.contains("advisory") {
            AlertKind::Advisory
        } else if e.contains("statement") {
            AlertKind::Statement
        } else if e.contains("outlook") || e.contains("forecast") {
            AlertKind::Forecast
        } else {
            AlertKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Warning => "warning",
            AlertKind::Watch => "watch",
            AlertKind::Advisory => "advisory",
            AlertKind::Statement => "statement",
            AlertKind::Forecast => "forecast",
            AlertKind::Other => "other",
        }
    }

    /// Parse a lowercase kind name; unknown names are `None`.
    pub fn parse(s: &str) -> Option<Self> {
        AlertKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_kinds() {
        assert_eq!(AlertKind::classify("Tornado Warning"), AlertKind::Warning);
        assert_eq!(AlertKind::classify("Winter Storm Watch"), AlertKind::Watch);
        assert_eq!(AlertKind::classify("Wind Advisory"), AlertKind::Advisory);
        assert_eq!(AlertKind::classify("Special Weather Statement"), AlertKind::Statement);
        assert_eq!(AlertKind::classify("Hazardous Weather Outlook"), AlertKind::Forecast);
        assert_eq!(AlertKind::classify("Air Quality Alert"), AlertKind::Other);
    }

    #[test]
    fn test_from_feature_defaults() {
        let alert = Alert::from_feature(json!({
            "id": "urn:1",
            "geometry": null,
            "properties": { "severity": "severe", "affectedZones": ["https://z/1"] }
        }))
        .unwrap();

        assert_eq!(alert.id, "urn:1");
        assert_eq!(alert.event, "Alert");
        assert_eq!(alert.severity, Severity::Severe);
        assert!(matches!(alert.draw_source(), DrawSource::Zones(z) if z.len() == 1));
    }

    #[test]
    fn test_missing_id_gets_uuid() {
        let alert = Alert::from_feature(json!({ "properties": {} })).unwrap();
        assert!(!alert.id.is_empty());
        assert_eq!(alert.draw_source(), DrawSource::None);
    }

    #[test]
    fn test_times_parse_with_offset() {
        let alert = Alert::from_feature(json!({
            "id": "a",
            "properties": { "sent": "2024-05-01T12:00:00-05:00", "expires": "garbage" }
        }))
        .unwrap();
        assert_eq!(alert.sent.unwrap().to_rfc3339(), "2024-05-01T17:00:00+00:00");
        assert!(alert.expires.is_none());
    }
}
