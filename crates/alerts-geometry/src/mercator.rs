//! Spherical (Web) Mercator pixel coordinates.
//!
//! Pixel space at zoom `z` is a square of `256 * 2^z` pixels with the origin
//! at the north-west corner, the same space slippy-map clients draw in.

use std::f64::consts::PI;

use alerts_common::BoundingBox;

/// Tile edge in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the square Mercator world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// World edge length in pixels at `zoom`.
pub fn world_size(zoom: u8) -> f64 {
    TILE_SIZE * 2f64.powi(zoom as i32)
}

/// Project `(lon, lat)` degrees to pixel `(x, y)` at `zoom`.
pub fn project(lon: f64, lat: f64, zoom: u8) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    let x = (lon + 180.0) / 360.0 * size;
    let y = (0.5 - (PI / 4.0 + lat / 2.0).tan().ln() / (2.0 * PI)) * size;
    (x, y)
}

/// Inverse of [`project`].
pub fn unproject(x: f64, y: f64, zoom: u8) -> (f64, f64) {
    let size = world_size(zoom);
    let lon = x / size * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * y / size);
    let lat = n.sinh().atan().to_degrees();
    (lon, lat)
}

/// Largest zoom (up to `max_zoom`) at which `bounds` fits a
/// `width_px` x `height_px` view.
pub fn bounds_zoom(bounds: &BoundingBox, width_px: f64, height_px: f64, max_zoom: u8) -> u8 {
    let (x0, y0) = project(bounds.min_x, bounds.max_y, 0);
    let (x1, y1) = project(bounds.max_x, bounds.min_y, 0);
    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();

    if dx <= f64::EPSILON && dy <= f64::EPSILON {
        return max_zoom;
    }

    let scale_x = if dx > 0.0 { width_px / dx } else { f64::INFINITY };
    let scale_y = if dy > 0.0 { height_px / dy } else { f64::INFINITY };
    let zoom = scale_x.min(scale_y).log2().floor();

    if zoom.is_nan() || zoom < 0.0 {
        0
    } else {
        (zoom as u32).min(max_zoom as u32) as u8
    }
}
