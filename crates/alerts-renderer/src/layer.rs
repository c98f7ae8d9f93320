//! Alert layers on a map surface: replace, focus, hover and point inspect.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use alerts_common::{Alert, BoundingBox};
use alerts_geometry::{geometry_contains, mercator::bounds_zoom};
use alerts_pipeline::{DrawFeature, FocusTarget, OverlaySet};

use crate::popup::PopupContent;
use crate::render::{plan_features, plan_overlay, RenderedShape, ADD_BATCH_SIZE};
use crate::style::{PathStyle, StylePalette};

/// Pad applied to the union of an alert's drawn shapes before focusing.
pub const FOCUS_PAD: f64 = 0.18;

/// Focus zoom is clamped to this range.
pub const FOCUS_MIN_ZOOM: u8 = 9;
pub const FOCUS_MAX_ZOOM: u8 = 12;

/// Independently toggled shape groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerGroup {
    /// Native polygons and per-alert zone shards.
    Alerts,
    /// Deduplicated zone overlay.
    Zones,
}

/// What a map library must provide to show alert shapes.
pub trait MapSurface {
    /// Remove every shape of `group`.
    fn clear(&mut self, group: LayerGroup);

    /// Add shapes to `group`.
    fn add_batch(&mut self, group: LayerGroup, shapes: &[RenderedShape]);

    fn set_visible(&mut self, group: LayerGroup, visible: bool);

    /// Restyle one shape already on the surface.
    fn set_style(&mut self, shape_id: &str, style: &PathStyle);

    /// Move the view so `bounds` is centred at `zoom`.
    fn fly_to(&mut self, bounds: &BoundingBox, zoom: u8);

    /// Open a popup anchored at `(lon, lat)`.
    fn open_popup(&mut self, at: (f64, f64), content: &PopupContent);

    /// Current view center as `(lon, lat)`.
    fn center(&self) -> (f64, f64);

    /// View size in pixels.
    fn size_px(&self) -> (f64, f64);
}

/// Owns the drawn shapes and drives a [`MapSurface`].
pub struct AlertsLayer<S: MapSurface> {
    surface: S,
    palette: StylePalette,
    shapes: Vec<RenderedShape>,
    overlay: Vec<RenderedShape>,
    hovered: Option<String>,
}

impl<S: MapSurface> AlertsLayer<S> {
    pub fn new(surface: S) -> Self {
        Self::with_palette(surface, StylePalette::default())
    }

    pub fn with_palette(surface: S, palette: StylePalette) -> Self {
        Self {
            surface,
            palette,
            shapes: Vec::new(),
            overlay: Vec::new(),
            hovered: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn palette(&self) -> &StylePalette {
        &self.palette
    }

    /// Shapes currently in the alerts group.
    pub fn shapes(&self) -> &[RenderedShape] {
        &self.shapes
    }

    /// Shapes currently in the zones group.
    pub fn overlay(&self) -> &[RenderedShape] {
        &self.overlay
    }

    /// Swap the alerts group for `features`. The zones group is cleared.
    pub fn replace(&mut self, features: &[DrawFeature]) -> usize {
        self.hovered = None;
        self.surface.clear(LayerGroup::Zones);
        self.overlay.clear();

        self.shapes = plan_features(features, &self.palette);
        add_in_batches(&mut self.surface, LayerGroup::Alerts, &self.shapes);

        debug!(shapes = self.shapes.len(), "Alert layer replaced");
        self.shapes.len()
    }

    /// Show an overlay: native shapes in the alerts group, one shape per
    /// zone in the zones group.
    pub fn replace_overlay(&mut self, set: &OverlaySet) -> usize {
        self.hovered = None;

        self.shapes = plan_features(&set.native, &self.palette);
        add_in_batches(&mut self.surface, LayerGroup::Alerts, &self.shapes);

        self.overlay = plan_overlay(&set.zones, &self.palette);
        add_in_batches(&mut self.surface, LayerGroup::Zones, &self.overlay);

        debug!(
            native = self.shapes.len(),
            zones = self.overlay.len(),
            "Alert overlay replaced"
        );
        self.shapes.len() + self.overlay.len()
    }

    pub fn set_visible(&mut self, group: LayerGroup, visible: bool) {
        self.surface.set_visible(group, visible);
    }

    fn drawn_for<'a>(
        &'a self,
        alert_id: &'a str,
    ) -> impl Iterator<Item = &'a RenderedShape> + 'a {
        self.shapes
            .iter()
            .chain(self.overlay.iter())
            .filter(move |s| s.covers(alert_id))
    }

    /// Move to everything drawn for `alert` and open its popup.
    ///
    /// Returns `None` when nothing is drawn; the popup then opens at the
    /// current map center.
    pub fn focus(&mut self, alert: &Alert) -> Option<FocusTarget> {
        let popup = PopupContent::for_alert(alert);

        let union = self
            .drawn_for(&alert.id)
            .map(|s| s.bbox)
            .reduce(|a, b| a.union(&b));

        let Some(union) = union else {
            let center = self.surface.center();
            self.surface.open_popup(center, &popup);
            return None;
        };

        let bounds = union.pad(FOCUS_PAD);
        let (width, height) = self.surface.size_px();
        let zoom = bounds_zoom(&bounds, width, height, FOCUS_MAX_ZOOM).max(FOCUS_MIN_ZOOM);
        let center = bounds.center();

        self.surface.fly_to(&bounds, zoom);
        self.surface.open_popup(center, &popup);

        Some(FocusTarget {
            alert_id: alert.id.clone(),
            bounds,
            center,
            zoom,
            from_drawn: true,
        })
    }

    /// Ids of every alert drawn at `(lon, lat)`, sorted and unique.
    pub fn alert_ids_at(&self, lon: f64, lat: f64) -> Vec<String> {
        let mut ids = BTreeSet::new();
        for shape in self.shapes.iter().chain(self.overlay.iter()) {
            if !shape.bbox.contains_point(lon, lat) {
                continue;
            }
            if geometry_contains(&shape.geometry, lon, lat) {
                ids.extend(shape.alert_ids.iter().cloned());
            }
        }
        ids.into_iter().collect()
    }

    /// Emphasise the shapes of `alert_id`, restoring the previous hover.
    pub fn hover(&mut self, alert_id: Option<&str>) {
        if self.hovered.as_deref() == alert_id {
            return;
        }

        if let Some(previous) = self.hovered.take() {
            let restore: Vec<(String, PathStyle)> = self
                .drawn_for(&previous)
                .map(|s| (s.id.clone(), s.style.clone()))
                .collect();
            for (id, style) in &restore {
                self.surface.set_style(id, style);
            }
        }

        if let Some(id) = alert_id {
            let emphasised: Vec<(String, PathStyle)> = self
                .drawn_for(id)
                .map(|s| (s.id.clone(), self.palette.hovered(&s.style)))
                .collect();
            for (shape_id, style) in &emphasised {
                self.surface.set_style(shape_id, style);
            }
            self.hovered = Some(id.to_string());
        }
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }
}

fn add_in_batches<S: MapSurface>(surface: &mut S, group: LayerGroup, shapes: &[RenderedShape]) {
    surface.clear(group);
    for batch in shapes.chunks(ADD_BATCH_SIZE) {
        surface.add_batch(group, batch);
    }
}
