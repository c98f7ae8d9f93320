//! Exact point-in-polygon tests.
//!
//! Backed by `geo::Intersects` on raw lon/lat. Points on a ring edge count
//! as inside, so a point on the shared border of two zones hits both, and
//! a point on a hole's edge still belongs to the polygon.

use alerts_common::AlertGeometry;
use geo::{Coord, Intersects, Polygon};

/// Inside or on the exterior ring and not strictly inside any hole.
pub fn point_in_polygon(polygon: &Polygon<f64>, lon: f64, lat: f64) -> bool {
    polygon.intersects(&Coord { x: lon, y: lat })
}

/// Whether any polygon of `geometry` contains `(lon, lat)`.
pub fn geometry_contains(geometry: &AlertGeometry, lon: f64, lat: f64) -> bool {
    let point = Coord { x: lon, y: lat };
    match geometry {
        AlertGeometry::Polygon(p) => p.intersects(&point),
        AlertGeometry::MultiPolygon(mp) => mp.intersects(&point),
    }
}
