//! Zoom-aware polygon simplification.
//!
//! Rings are projected to Mercator pixel space at the target zoom and
//! reduced with Douglas-Peucker (`geo::SimplifyIdx`) against the pixel
//! tolerance. Kept vertices are taken from the original ring, so retained
//! coordinates are bit-identical to the input.

use alerts_common::AlertGeometry;
use geo::{LineString, SimplifyIdx};

use crate::mercator;

/// Rings never drop below this many positions.
pub const MIN_RING_POINTS: usize = 4;

/// Pixel tolerance tier for a zoom level: coarser when zoomed out.
pub fn tolerance_for_zoom(zoom: u8) -> f64 {
    match zoom {
        z if z >= 11 => 0.6,
        z if z >= 9 => 1.0,
        z if z >= 7 => 1.8,
        _ => 3.0,
    }
}

/// Simplify every ring of a geometry, keeping polygon and ring counts.
pub fn simplify_geometry(geometry: &AlertGeometry, tolerance_px: f64, zoom: u8) -> AlertGeometry {
    geometry.map_rings(|ring| simplify_ring(ring, tolerance_px, zoom))
}

/// Simplify one ring.
///
/// Rings shorter than [`MIN_RING_POINTS`] and rings that would collapse
/// below it come back unchanged. Any ring produced by simplification is
/// closed.
pub fn simplify_ring(ring: &LineString<f64>, tolerance_px: f64, zoom: u8) -> LineString<f64> {
    if ring.0.len() < MIN_RING_POINTS || tolerance_px <= 0.0 {
        return ring.clone();
    }

    let pixels: LineString<f64> = ring
        .coords()
        .map(|c| mercator::project(c.x, c.y, zoom))
        .collect::<Vec<_>>()
        .into();

    let kept = pixels.simplify_idx(&tolerance_px);
    if kept.len() < MIN_RING_POINTS {
        return ring.clone();
    }

    let mut out = LineString::new(kept.into_iter().map(|i| ring.0[i]).collect());
    out.close();
    out
}
