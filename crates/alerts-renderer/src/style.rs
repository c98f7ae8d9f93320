//! Severity styling for alert shapes.
//!
//! One palette maps every [`Severity`] to a color; stroke and fill share it.
//! Line weight and opacities depend on what kind of shape is drawn.

use serde::{Deserialize, Serialize};

use alerts_common::{AlertError, AlertResult, Severity};

/// Shape kinds that get distinct path weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeRole {
    /// The alert's own polygon.
    Native,
    /// One zone drawn for one alert.
    ZoneShard,
    /// One zone drawn once for every alert naming it.
    Overlay,
}

/// Path options handed to the map surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStyle {
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub line_cap: String,
    pub line_join: String,
}

/// Stroke weight and opacities for one shape role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeSpec {
    pub weight: f64,
    pub opacity: f64,
    pub fill_opacity: f64,
}

/// Severity colors plus stroke specs, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylePalette {
    pub extreme: String,
    pub severe: String,
    pub moderate: String,
    pub minor: String,
    pub unknown: String,
    pub native: StrokeSpec,
    pub zone: StrokeSpec,
    pub hover_weight: f64,
    pub hover_fill_opacity: f64,
}

impl Default for StylePalette {
    fn default() -> Self {
        Self {
            extreme: "#a855f7".to_string(),
            severe: "#ef4444".to_string(),
            moderate: "#f59e0b".to_string(),
            minor: "#60a5fa".to_string(),
            unknown: "#94a3b8".to_string(),
            native: StrokeSpec {
                weight: 2.25,
                opacity: 0.92,
                fill_opacity: 0.12,
            },
            zone: StrokeSpec {
                weight: 1.5,
                opacity: 0.70,
                fill_opacity: 0.06,
            },
            hover_weight: 3.25,
            hover_fill_opacity: 0.16,
        }
    }
}

impl StylePalette {
    /// Load a palette from a JSON string. Missing fields keep their defaults.
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Every color must be a six-digit hex string.
    pub fn validate(&self) -> AlertResult<()> {
        for severity in Severity::ALL {
            let color = self.color(severity);
            if hex_to_rgb(color).is_none() {
                return Err(AlertError::Config(format!(
                    "invalid color '{}' for severity {}",
                    color, severity
                )));
            }
        }
        Ok(())
    }

    pub fn color(&self, severity: Severity) -> &str {
        match severity {
            Severity::Extreme => &self.extreme,
            Severity::Severe => &self.severe,
            Severity::Moderate => &self.moderate,
            Severity::Minor => &self.minor,
            Severity::Unknown => &self.unknown,
        }
    }

    /// Resting style for a shape.
    pub fn style_for(&self, role: ShapeRole, severity: Severity) -> PathStyle {
        let stroke = match role {
            ShapeRole::Native => self.native,
            ShapeRole::ZoneShard | ShapeRole::Overlay => self.zone,
        };
        let color = self.color(severity).to_string();
        PathStyle {
            fill_color: color.clone(),
            color,
            weight: stroke.weight,
            opacity: stroke.opacity,
            fill_opacity: stroke.fill_opacity,
            line_cap: "round".to_string(),
            line_join: "round".to_string(),
        }
    }

    /// Emphasised variant of `base` for the hovered alert.
    pub fn hovered(&self, base: &PathStyle) -> PathStyle {
        PathStyle {
            weight: self.hover_weight,
            fill_opacity: self.hover_fill_opacity,
            ..base.clone()
        }
    }
}

/// Color of a severity in the default palette.
pub fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Extreme => "#a855f7",
        Severity::Severe => "#ef4444",
        Severity::Moderate => "#f59e0b",
        Severity::Minor => "#60a5fa",
        Severity::Unknown => "#94a3b8",
    }
}

/// Parse hex color string to RGB
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}
