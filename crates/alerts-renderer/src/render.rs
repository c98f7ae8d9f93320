//! Pure planning from draw features to styled shapes.
//!
//! Nothing here touches a map; [`crate::layer::AlertsLayer`] hands the plan
//! to a [`crate::layer::MapSurface`].

use serde::Serialize;
use serde_json::{json, Value};

use alerts_common::{AlertGeometry, BoundingBox, Severity};
use alerts_pipeline::{DrawFeature, GeometrySource, OverlayFeature};

use crate::style::{PathStyle, ShapeRole, StylePalette};

/// Shapes handed to the surface per `add_batch` call.
pub const ADD_BATCH_SIZE: usize = 250;

/// A shape with its resolved style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedShape {
    /// Draw feature id, or the zone URL for overlay shapes.
    pub id: String,
    /// Alerts this shape stands for. One entry except for overlay zones.
    pub alert_ids: Vec<String>,
    pub role: ShapeRole,
    pub severity: Severity,
    pub label: Option<String>,
    pub style: PathStyle,
    pub geometry: AlertGeometry,
    pub bbox: BoundingBox,
}

impl RenderedShape {
    pub fn from_draw_feature(feature: &DrawFeature, palette: &StylePalette) -> Self {
        let role = match feature.source {
            GeometrySource::Native => ShapeRole::Native,
            GeometrySource::ZoneFallback => ShapeRole::ZoneShard,
        };
        Self {
            id: feature.id.clone(),
            alert_ids: vec![feature.alert_id.clone()],
            role,
            severity: feature.severity,
            label: feature.zone_name.clone(),
            style: palette.style_for(role, feature.severity),
            geometry: feature.geometry.clone(),
            bbox: feature.bbox,
        }
    }

    pub fn from_overlay(zone: &OverlayFeature, palette: &StylePalette) -> Self {
        Self {
            id: zone.zone_url.clone(),
            alert_ids: zone.alert_ids.clone(),
            role: ShapeRole::Overlay,
            severity: zone.severity,
            label: Some(zone.zone_name.clone()).filter(|n| !n.is_empty()),
            style: palette.style_for(ShapeRole::Overlay, zone.severity),
            geometry: zone.geometry.clone(),
            bbox: zone.bbox,
        }
    }

    /// Whether this shape stands for `alert_id`.
    pub fn covers(&self, alert_id: &str) -> bool {
        self.alert_ids.iter().any(|id| id == alert_id)
    }

    /// GeoJSON Feature with the style inlined in `properties.style`.
    pub fn to_feature(&self) -> Value {
        json!({
            "type": "Feature",
            "id": self.id,
            "geometry": self.geometry,
            "properties": {
                "id": self.id,
                "alertId": self.alert_ids.first(),
                "alertIds": self.alert_ids,
                "role": self.role,
                "severity": self.severity,
                "label": self.label,
                "style": self.style,
            }
        })
    }
}

pub fn plan_features(features: &[DrawFeature], palette: &StylePalette) -> Vec<RenderedShape> {
    features
        .iter()
        .map(|f| RenderedShape::from_draw_feature(f, palette))
        .collect()
}

pub fn plan_overlay(zones: &[OverlayFeature], palette: &StylePalette) -> Vec<RenderedShape> {
    zones
        .iter()
        .map(|z| RenderedShape::from_overlay(z, palette))
        .collect()
}

/// FeatureCollection of the given shapes.
pub fn feature_collection<'a, I>(shapes: I) -> Value
where
    I: IntoIterator<Item = &'a RenderedShape>,
{
    let features: Vec<Value> = shapes.into_iter().map(RenderedShape::to_feature).collect();
    json!({ "type": "FeatureCollection", "features": features })
}
