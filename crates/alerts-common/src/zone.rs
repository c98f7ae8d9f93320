//! Forecast/county zone geometry used as alert fallback.

use geojson::{feature::Id, Feature};
use serde::Serialize;
use serde_json::Value;

use crate::bbox::BoundingBox;
use crate::geometry::AlertGeometry;

/// A zone resolved from its NWS URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    /// The URL the zone was fetched from.
    pub url: String,
    /// Feature id, then `properties.id`, then the URL.
    pub id: String,
    pub name: String,
    pub geometry: AlertGeometry,
    pub bbox: BoundingBox,
}

impl Zone {
    /// Build a zone from a fetched GeoJSON body.
    ///
    /// Anything that is not a `Feature` with Polygon/MultiPolygon geometry
    /// yields `None`.
    pub fn from_feature(url: &str, value: &Value) -> Option<Self> {
        let feature = Feature::from_json_value(value.clone()).ok()?;
        let geometry = AlertGeometry::from_geojson(&feature.geometry.as_ref()?.value)?;
        let bbox = geometry.bbox()?;

        let prop_str = |key: &str| {
            feature
                .property(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let feature_id = match &feature.id {
            Some(Id::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Id::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let id = feature_id
            .or_else(|| prop_str("id"))
            .unwrap_or_else(|| url.to_string());
        let name = prop_str("name")
            .or_else(|| prop_str("id"))
            .unwrap_or_default();

        Some(Self {
            url: url.to_string(),
            id,
            name,
            geometry,
            bbox,
        })
    }

    /// Zone with explicit geometry, used for derived (simplified) copies.
    pub fn with_geometry(&self, geometry: AlertGeometry) -> Self {
        let bbox = geometry.bbox().unwrap_or(self.bbox);
        Self {
            url: self.url.clone(),
            id: self.id.clone(),
            name: self.name.clone(),
            geometry,
            bbox,
        }
    }
}
