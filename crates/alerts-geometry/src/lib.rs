//! Geometry operations for drawing alert polygons.
//!
//! - Web Mercator pixel projection at integer zoom levels
//! - Zoom-aware polygon simplification (`geo` Douglas-Peucker in pixel space)
//! - Padded viewport filtering
//! - Exact point-in-polygon hit testing (`geo::Intersects`)

pub mod contains;
pub mod mercator;
pub mod simplify;
pub mod viewport;

pub use contains::{geometry_contains, point_in_polygon};
pub use simplify::{simplify_geometry, simplify_ring, tolerance_for_zoom, MIN_RING_POINTS};
pub use viewport::{Viewport, ViewportFilter, DEFAULT_VIEWPORT_PAD};
