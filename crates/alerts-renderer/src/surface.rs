//! In-memory [`MapSurface`] that serializes to GeoJSON.
//!
//! The API server renders into one of these per request and returns the
//! visible groups as a FeatureCollection.

use std::collections::BTreeMap;

use serde_json::Value;

use alerts_common::BoundingBox;

use crate::layer::{LayerGroup, MapSurface};
use crate::popup::PopupContent;
use crate::render::{feature_collection, RenderedShape};
use crate::style::PathStyle;

/// A popup opened on the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenPopup {
    pub at: (f64, f64),
    pub content: PopupContent,
}

#[derive(Debug, Clone)]
pub struct GeoJsonSurface {
    groups: BTreeMap<LayerGroup, Vec<RenderedShape>>,
    hidden: Vec<LayerGroup>,
    view: BoundingBox,
    zoom: u8,
    size_px: (f64, f64),
    popup: Option<OpenPopup>,
    batches_added: usize,
}

impl GeoJsonSurface {
    pub fn new(view: BoundingBox, zoom: u8, size_px: (f64, f64)) -> Self {
        Self {
            groups: BTreeMap::new(),
            hidden: Vec::new(),
            view,
            zoom,
            size_px,
            popup: None,
            batches_added: 0,
        }
    }

    pub fn shapes(&self, group: LayerGroup) -> &[RenderedShape] {
        self.groups.get(&group).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_visible(&self, group: LayerGroup) -> bool {
        !self.hidden.contains(&group)
    }

    pub fn view(&self) -> (&BoundingBox, u8) {
        (&self.view, self.zoom)
    }

    pub fn popup(&self) -> Option<&OpenPopup> {
        self.popup.as_ref()
    }

    /// Number of `add_batch` calls so far.
    pub fn batches_added(&self) -> usize {
        self.batches_added
    }

    /// Current style of a shape, after any hover restyling.
    pub fn style_of(&self, shape_id: &str) -> Option<&PathStyle> {
        self.groups
            .values()
            .flatten()
            .find(|s| s.id == shape_id)
            .map(|s| &s.style)
    }

    /// Visible groups as one FeatureCollection, alerts before zones.
    pub fn to_feature_collection(&self) -> Value {
        feature_collection(
            self.groups
                .iter()
                .filter(|(group, _)| self.is_visible(**group))
                .flat_map(|(_, shapes)| shapes.iter()),
        )
    }
}

impl MapSurface for GeoJsonSurface {
    fn clear(&mut self, group: LayerGroup) {
        self.groups.remove(&group);
    }

    fn add_batch(&mut self, group: LayerGroup, shapes: &[RenderedShape]) {
        self.groups.entry(group).or_default().extend_from_slice(shapes);
        self.batches_added += 1;
    }

    fn set_visible(&mut self, group: LayerGroup, visible: bool) {
        self.hidden.retain(|g| *g != group);
        if !visible {
            self.hidden.push(group);
        }
    }

    fn set_style(&mut self, shape_id: &str, style: &PathStyle) {
        for shape in self.groups.values_mut().flatten() {
            if shape.id == shape_id {
                shape.style = style.clone();
            }
        }
    }

    fn fly_to(&mut self, bounds: &BoundingBox, zoom: u8) {
        self.view = *bounds;
        self.zoom = zoom;
    }

    fn open_popup(&mut self, at: (f64, f64), content: &PopupContent) {
        self.popup = Some(OpenPopup {
            at,
            content: content.clone(),
        });
    }

    fn center(&self) -> (f64, f64) {
        self.view.center()
    }

    fn size_px(&self) -> (f64, f64) {
        self.size_px
    }
}
