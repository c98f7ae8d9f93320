//! Polygon geometry carried by alerts and zones.
//!
//! Only Polygon and MultiPolygon are drawable; every other GeoJSON geometry
//! type is treated as "no geometry". Shapes are held as `geo` types and
//! travel over the wire as GeoJSON geometry objects.

use geo::{BoundingRect, CoordsIter, LineString, MultiPolygon, Polygon};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::bbox::BoundingBox;

/// A `[longitude, latitude]` pair.
pub type Position = [f64; 2];

/// Raw ring coordinates, as used to build shapes.
pub type Ring = Vec<Position>;

/// Drawable alert/zone geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl AlertGeometry {
    /// Polygon from raw rings: the first is the exterior, the rest are holes.
    pub fn polygon(rings: Vec<Ring>) -> Self {
        AlertGeometry::Polygon(polygon_from_rings(rings))
    }

    pub fn multi_polygon(polygons: Vec<Vec<Ring>>) -> Self {
        AlertGeometry::MultiPolygon(MultiPolygon::new(
            polygons.into_iter().map(polygon_from_rings).collect(),
        ))
    }

    /// Parse a GeoJSON geometry object.
    ///
    /// Returns `None` for null, unsupported types, or coordinates without
    /// any position. Extra position members (altitude) are dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            return None;
        }
        let geometry = geojson::Geometry::from_json_value(value.clone()).ok()?;
        Self::from_geojson(&geometry.value)
    }

    pub fn from_geojson(value: &geojson::Value) -> Option<Self> {
        let geometry = match value {
            geojson::Value::Polygon(_) => {
                AlertGeometry::Polygon(Polygon::try_from(value).ok()?)
            }
            geojson::Value::MultiPolygon(_) => {
                AlertGeometry::MultiPolygon(MultiPolygon::try_from(value).ok()?)
            }
            _ => return None,
        };

        if geometry.position_count() == 0 {
            return None;
        }
        Some(geometry)
    }

    pub fn to_geojson(&self) -> geojson::Geometry {
        let value = match self {
            AlertGeometry::Polygon(p) => geojson::Value::from(p),
            AlertGeometry::MultiPolygon(mp) => geojson::Value::from(mp),
        };
        geojson::Geometry::new(value)
    }

    /// Polygons regardless of variant.
    pub fn polygons(&self) -> Vec<&Polygon<f64>> {
        match self {
            AlertGeometry::Polygon(p) => vec![p],
            AlertGeometry::MultiPolygon(mp) => mp.0.iter().collect(),
        }
    }

    /// Apply `f` to every ring, keeping the polygon/ring structure.
    pub fn map_rings<F>(&self, mut f: F) -> AlertGeometry
    where
        F: FnMut(&LineString<f64>) -> LineString<f64>,
    {
        let mut map_polygon = |p: &Polygon<f64>| {
            Polygon::new(f(p.exterior()), p.interiors().iter().map(&mut f).collect())
        };
        match self {
            AlertGeometry::Polygon(p) => AlertGeometry::Polygon(map_polygon(p)),
            AlertGeometry::MultiPolygon(mp) => {
                AlertGeometry::MultiPolygon(MultiPolygon::new(mp.iter().map(map_polygon).collect()))
            }
        }
    }

    pub fn position_count(&self) -> usize {
        match self {
            AlertGeometry::Polygon(p) => p.coords_count(),
            AlertGeometry::MultiPolygon(mp) => mp.coords_count(),
        }
    }

    pub fn ring_count(&self) -> usize {
        self.polygons()
            .iter()
            .map(|p| 1 + p.interiors().len())
            .sum()
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        let rect = match self {
            AlertGeometry::Polygon(p) => p.bounding_rect(),
            AlertGeometry::MultiPolygon(mp) => mp.bounding_rect(),
        };
        rect.map(BoundingBox::from)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AlertGeometry::Polygon(_) => "Polygon",
            AlertGeometry::MultiPolygon(_) => "MultiPolygon",
        }
    }
}

fn polygon_from_rings(rings: Vec<Ring>) -> Polygon<f64> {
    let mut rings = rings.into_iter().map(LineString::from);
    let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
    Polygon::new(exterior, rings.collect())
}

impl Serialize for AlertGeometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_geojson().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AlertGeometry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let geometry = geojson::Geometry::deserialize(deserializer)?;
        AlertGeometry::from_geojson(&geometry.value)
            .ok_or_else(|| de::Error::custom("expected a non-empty Polygon or MultiPolygon"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_polygon_with_altitude() {
        let value = json!({
            "type": "Polygon",
            "coordinates": [[[-75.0, 40.0, 10.0], [-74.0, 40.0], [-74.0, 41.0], [-75.0, 40.0]]]
        });
        let geom = AlertGeometry::from_value(&value).unwrap();
        assert_eq!(geom.position_count(), 4);
        assert_eq!(geom.ring_count(), 1);
    }

    #[test]
    fn test_unsupported_type_is_none() {
        let value = json!({ "type": "Point", "coordinates": [-75.0, 40.0] });
        assert!(AlertGeometry::from_value(&value).is_none());
        assert!(AlertGeometry::from_value(&Value::Null).is_none());

        let empty = json!({ "type": "Polygon", "coordinates": [] });
        assert!(AlertGeometry::from_value(&empty).is_none());

        let short = json!({ "type": "Polygon", "coordinates": [[[-75.0], [-74.0, 40.0]]] });
        assert!(AlertGeometry::from_value(&short).is_none());
    }

    #[test]
    fn test_multipolygon_bbox() {
        let value = json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                [[[5.0, 5.0], [6.0, 5.0], [6.0, 7.0], [5.0, 5.0]]]
            ]
        });
        let bbox = AlertGeometry::from_value(&value).unwrap().bbox().unwrap();
        assert_eq!(bbox, BoundingBox::new(0.0, 0.0, 6.0, 7.0));
    }

    #[test]
    fn test_open_rings_are_closed() {
        let geom = AlertGeometry::polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]]);
        let rings = geom.polygons();
        assert!(rings[0].exterior().is_closed());
        assert_eq!(geom.position_count(), 4);
    }

    #[test]
    fn test_serializes_as_geojson() {
        let geom = AlertGeometry::polygon(vec![vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 0.0],
        ]]);
        let value = serde_json::to_value(&geom).unwrap();
        assert_eq!(value["type"], "Polygon");
        assert_eq!(value["coordinates"][0][2], json!([1.0, 1.0]));

        let back: AlertGeometry = serde_json::from_value(value).unwrap();
        assert_eq!(back, geom);
    }
}
