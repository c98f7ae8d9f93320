//! Common alert and zone fixtures.

use serde_json::{json, Value};

use alerts_common::{Alert, AlertGeometry, Ring};

use crate::generators::square_ring;

/// Common bounding boxes as `(west, south, east, north)`.
pub mod bbox {
    /// Continental United States
    pub const CONUS: (f64, f64, f64, f64) = (-130.0, 20.0, -60.0, 55.0);

    /// Roughly the New York City metro area at ~zoom 9
    pub const NYC_METRO: (f64, f64, f64, f64) = (-75.0, 40.0, -73.0, 41.5);

    /// The square used by the point-inspect example
    pub const UNIT_SQUARE_NJ: (f64, f64, f64, f64) = (-75.0, 40.0, -74.0, 41.0);

    /// Far from every other fixture
    pub const PACIFIC_NW: (f64, f64, f64, f64) = (-124.0, 46.0, -122.0, 48.0);
}

/// Base URL used for fake zone references.
pub const ZONE_BASE: &str = "https://api.weather.gov/zones/forecast";

/// Zone URL for a zone id.
pub fn zone_url(id: &str) -> String {
    format!("{}/{}", ZONE_BASE, id)
}

/// Polygon geometry covering `(west, south, east, north)`.
pub fn square_polygon(b: (f64, f64, f64, f64)) -> AlertGeometry {
    AlertGeometry::polygon(vec![square_ring(b)])
}

/// A zone body as returned by `/zones/forecast/{id}`.
pub fn zone_feature(id: &str, name: &str, rings: Vec<Ring>) -> Value {
    json!({
        "id": zone_url(id),
        "type": "Feature",
        "geometry": { "type": "Polygon", "coordinates": rings },
        "properties": { "id": id, "name": name, "type": "public" }
    })
}

/// Zone body covering a square.
pub fn square_zone_feature(id: &str, b: (f64, f64, f64, f64)) -> Value {
    zone_feature(id, &format!("Zone {}", id), vec![square_ring(b)])
}

/// Builder for feed alert features.
#[derive(Debug, Clone)]
pub struct AlertBuilder {
    id: String,
    event: String,
    severity: String,
    headline: String,
    area_desc: String,
    description: String,
    sent: Option<String>,
    geometry: Value,
    zones: Vec<String>,
}

impl AlertBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            event: "Special Weather Statement".to_string(),
            severity: "Moderate".to_string(),
            headline: String::new(),
            area_desc: String::new(),
            description: String::new(),
            sent: None,
            geometry: Value::Null,
            zones: Vec::new(),
        }
    }

    pub fn event(mut self, event: &str) -> Self {
        self.event = event.to_string();
        self
    }

    pub fn severity(mut self, severity: &str) -> Self {
        self.severity = severity.to_string();
        self
    }

    pub fn headline(mut self, headline: &str) -> Self {
        self.headline = headline.to_string();
        self
    }

    pub fn area(mut self, area_desc: &str) -> Self {
        self.area_desc = area_desc.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// RFC 3339 send time.
    pub fn sent(mut self, sent: &str) -> Self {
        self.sent = Some(sent.to_string());
        self
    }

    /// Native square polygon.
    pub fn square(mut self, b: (f64, f64, f64, f64)) -> Self {
        self.geometry = json!({ "type": "Polygon", "coordinates": [square_ring(b)] });
        self
    }

    pub fn geometry(mut self, geometry: Value) -> Self {
        self.geometry = geometry;
        self
    }

    /// Zone references by zone id.
    pub fn zones(mut self, ids: &[&str]) -> Self {
        self.zones = ids.iter().map(|id| zone_url(id)).collect();
        self
    }

    pub fn zone_urls(mut self, urls: Vec<String>) -> Self {
        self.zones = urls;
        self
    }

    /// The feed Feature.
    pub fn feature(&self) -> Value {
        json!({
            "id": self.id,
            "type": "Feature",
            "geometry": self.geometry,
            "properties": {
                "id": self.id,
                "event": self.event,
                "severity": self.severity,
                "urgency": "Expected",
                "certainty": "Likely",
                "headline": self.headline,
                "areaDesc": self.area_desc,
                "description": self.description,
                "instruction": "",
                "sent": self.sent,
                "affectedZones": self.zones,
                "senderName": "NWS Test Office",
                "status": "Actual",
                "messageType": "Alert"
            }
        })
    }

    /// Parsed alert.
    pub fn build(&self) -> Alert {
        Alert::from_feature(self.feature()).expect("fixture alert should parse")
    }
}

/// A FeatureCollection body around the given alert features.
pub fn feature_collection(features: Vec<Value>) -> Value {
    json!({ "type": "FeatureCollection", "features": features })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerts_common::DrawSource;

    #[test]
    fn test_builder_native_and_zone() {
        let native = AlertBuilder::new("A1").square(bbox::UNIT_SQUARE_NJ).build();
        assert!(matches!(native.draw_source(), DrawSource::Native(_)));

        let zoned = AlertBuilder::new("A2").zones(&["NYZ072"]).build();
        match zoned.draw_source() {
            DrawSource::Zones(urls) => assert_eq!(urls[0], zone_url("NYZ072")),
            other => panic!("unexpected draw source {:?}", other),
        }
    }
}
