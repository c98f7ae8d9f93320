//! Map viewport and padded-bounds filtering.

use serde::{Deserialize, Serialize};

use alerts_common::{AlertError, AlertResult, BoundingBox};

/// Fraction of the viewport width/height added on every side before
/// filtering, so shapes just off screen are ready when the user pans.
pub const DEFAULT_VIEWPORT_PAD: f64 = 0.55;

/// Highest zoom accepted from clients.
pub const MAX_ZOOM: u8 = 22;

/// The map's visible bounds and integer zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub bounds: BoundingBox,
    pub zoom: u8,
}

impl Viewport {
    pub fn new(bounds: BoundingBox, zoom: u8) -> Self {
        Self { bounds, zoom }
    }

    /// Parse `bbox` ("west,south,east,north") and `zoom` query values.
    pub fn from_query(bbox: &str, zoom: u8) -> AlertResult<Self> {
        if zoom > MAX_ZOOM {
            return Err(AlertError::InvalidParameter {
                param: "zoom".to_string(),
                message: format!("must be <= {}", MAX_ZOOM),
            });
        }
        Ok(Self::new(BoundingBox::from_query_string(bbox)?, zoom))
    }

    pub fn padded(&self, pad: f64) -> BoundingBox {
        self.bounds.pad(pad)
    }

    /// Center followed by the NW, NE, SW, SE corners, as `(lat, lon)`.
    pub fn sample_points(&self) -> [(f64, f64); 5] {
        let (cx, cy) = self.bounds.center();
        let [nw, ne, sw, se] = self.bounds.corners();
        [
            (cy, cx),
            (nw.1, nw.0),
            (ne.1, ne.0),
            (sw.1, sw.0),
            (se.1, se.0),
        ]
    }
}

/// Accepts bounding boxes that overlap a padded viewport.
#[derive(Debug, Clone, Copy)]
pub struct ViewportFilter {
    padded: BoundingBox,
}

impl ViewportFilter {
    pub fn new(viewport: &Viewport, pad: f64) -> Self {
        Self {
            padded: viewport.padded(pad),
        }
    }

    pub fn padded_bounds(&self) -> &BoundingBox {
        &self.padded
    }

    pub fn accepts(&self, bbox: &BoundingBox) -> bool {
        self.padded.intersects(bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_uses_padding() {
        let vp = Viewport::new(BoundingBox::new(-75.0, 40.0, -74.0, 41.0), 8);
        let near = BoundingBox::new(-73.7, 40.0, -73.6, 40.1);
        let far = BoundingBox::new(-70.0, 40.0, -69.0, 41.0);

        assert!(!ViewportFilter::new(&vp, 0.0).accepts(&near));
        assert!(ViewportFilter::new(&vp, DEFAULT_VIEWPORT_PAD).accepts(&near));
        assert!(!ViewportFilter::new(&vp, DEFAULT_VIEWPORT_PAD).accepts(&far));
    }

    #[test]
    fn test_sample_points_lat_lon_order() {
        let vp = Viewport::new(BoundingBox::new(-80.0, 30.0, -70.0, 40.0), 6);
        let pts = vp.sample_points();
        assert_eq!(pts[0], (35.0, -75.0));
        assert_eq!(pts[1], (40.0, -80.0));
        assert_eq!(pts[4], (30.0, -70.0));
    }

    #[test]
    fn test_from_query_rejects_large_zoom() {
        assert!(Viewport::from_query("-80,30,-70,40", 30).is_err());
        assert!(Viewport::from_query("-80,30,-70,40", 9).is_ok());
    }
}
