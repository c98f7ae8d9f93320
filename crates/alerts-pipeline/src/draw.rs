//! Draw features: the shapes actually placed on the map.

use serde::Serialize;

use alerts_common::{Alert, AlertGeometry, BoundingBox, Severity, Zone};

/// Separator between an alert id and a zone id in composite feature ids.
pub const ZONE_ID_SEPARATOR: &str = "::zone::";

/// Where a draw feature's geometry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometrySource {
    Native,
    ZoneFallback,
}

/// One drawable shape, traceable to its alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawFeature {
    /// The alert id for native shapes, `alertId::zone::zoneId` for zone shards.
    pub id: String,
    pub alert_id: String,
    pub source: GeometrySource,
    pub zone_name: Option<String>,
    pub zone_url: Option<String>,
    pub event: String,
    pub severity: Severity,
    pub geometry: AlertGeometry,
    pub bbox: BoundingBox,
}

/// Composite id of a zone shard.
pub fn zone_feature_id(alert_id: &str, zone_id: &str) -> String {
    format!("{}{}{}", alert_id, ZONE_ID_SEPARATOR, zone_id)
}

/// Alert id of a feature id, stripping any zone suffix.
pub fn base_alert_id(feature_id: &str) -> &str {
    match feature_id.find(ZONE_ID_SEPARATOR) {
        Some(idx) => &feature_id[..idx],
        None => feature_id,
    }
}

impl DrawFeature {
    /// Shape from the alert's own geometry; `None` for empty geometry.
    pub fn native(alert: &Alert, geometry: &AlertGeometry) -> Option<Self> {
        let bbox = geometry.bbox()?;
        Some(Self {
            id: alert.id.clone(),
            alert_id: alert.id.clone(),
            source: GeometrySource::Native,
            zone_name: None,
            zone_url: None,
            event: alert.event.clone(),
            severity: alert.severity,
            geometry: geometry.clone(),
            bbox,
        })
    }

    /// Zone shard of an alert.
    pub fn zone(alert: &Alert, zone: &Zone) -> Self {
        Self {
            id: zone_feature_id(&alert.id, &zone.id),
            alert_id: alert.id.clone(),
            source: GeometrySource::ZoneFallback,
            zone_name: Some(zone.name.clone()).filter(|n| !n.is_empty()),
            zone_url: Some(zone.url.clone()),
            event: alert.event.clone(),
            severity: alert.severity,
            geometry: zone.geometry.clone(),
            bbox: zone.bbox,
        }
    }

    pub fn is_zone_shard(&self) -> bool {
        self.source == GeometrySource::ZoneFallback
    }

    /// Whether this shape was drawn for `alert_id`, natively or as a shard.
    pub fn belongs_to(&self, alert_id: &str) -> bool {
        self.id == alert_id
            || self
                .id
                .strip_prefix(alert_id)
                .is_some_and(|rest| rest.starts_with(ZONE_ID_SEPARATOR))
    }
}
