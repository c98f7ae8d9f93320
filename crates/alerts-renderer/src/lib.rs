//! Alert shape rendering.
//!
//! Styling and hit testing are pure functions over draw features; anything
//! map-specific goes through the [`MapSurface`] trait.

pub mod layer;
pub mod popup;
pub mod render;
pub mod style;
pub mod surface;

pub use layer::{AlertsLayer, LayerGroup, MapSurface, FOCUS_MAX_ZOOM, FOCUS_MIN_ZOOM, FOCUS_PAD};
pub use popup::{split_sections, PopupContent, PopupSection};
pub use render::{feature_collection, plan_features, plan_overlay, RenderedShape, ADD_BATCH_SIZE};
pub use style::{hex_to_rgb, severity_color, PathStyle, ShapeRole, StylePalette};
pub use surface::{GeoJsonSurface, OpenPopup};
