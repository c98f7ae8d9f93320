//! Service configuration, loaded from an optional YAML file.
//!
//! Every field has a default, so an empty file (or no file) is valid.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use alerts_cache::DEFAULT_SIMPLIFY_CAPACITY;
use alerts_geometry::Viewport;
use alerts_pipeline::{FeedConfig, UpdaterConfig};
use alerts_renderer::StylePalette;

/// Viewport drawn after each refresh to keep the zone caches warm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmViewport {
    /// `west,south,east,north`
    pub bbox: String,
    pub zoom: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub feed: FeedConfig,
    pub updater: UpdaterConfig,
    pub style: StylePalette,
    pub refresh_interval_secs: u64,
    /// Lower zone caps for every draw request unless the request says otherwise.
    pub performance: bool,
    pub debounce_ms: u64,
    pub sample_throttle_ms: u64,
    /// Sample the viewport corners and center for a boost pass.
    pub sample_viewport: bool,
    pub overlay_concurrency: usize,
    pub simplify_cache_capacity: usize,
    /// View size used for focus zoom when the request omits it.
    pub view_width_px: f64,
    pub view_height_px: f64,
    pub warm_viewport: Option<WarmViewport>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            updater: UpdaterConfig::default(),
            style: StylePalette::default(),
            refresh_interval_secs: 60,
            performance: false,
            debounce_ms: 250,
            sample_throttle_ms: 1200,
            sample_viewport: true,
            overlay_concurrency: 10,
            simplify_cache_capacity: DEFAULT_SIMPLIFY_CAPACITY,
            view_width_px: 1280.0,
            view_height_px: 800.0,
            warm_viewport: None,
        }
    }
}

impl ServiceConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ServiceConfig =
            serde_yaml::from_str(yaml).context("Failed to parse service config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            info!("No config file given, using defaults");
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid config file {:?}", path))?;

        info!(path = ?path, "Loaded service config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.style.validate()?;
        if self.refresh_interval_secs == 0 {
            anyhow::bail!("refresh_interval_secs must be greater than zero");
        }
        if let Some(warm) = &self.warm_viewport {
            Viewport::from_query(&warm.bbox, warm.zoom).context("Invalid warm_viewport")?;
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn sample_throttle(&self) -> Duration {
        Duration::from_millis(self.sample_throttle_ms)
    }

    pub fn warm_viewport(&self) -> Option<Viewport> {
        let warm = self.warm_viewport.as_ref()?;
        Viewport::from_query(&warm.bbox, warm.zoom).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config = ServiceConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.refresh_interval(), Duration::from_secs(60));
        assert_eq!(config.updater.base_max_total_zones, 600);
        assert!(config.warm_viewport().is_none());
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = r##"
feed:
  user_agent: "my-dashboard (me@example.com)"
updater:
  base_max_total_zones: 300
style:
  severe: "#ff0000"
performance: true
warm_viewport:
  bbox: "-75,40,-73,41.5"
  zoom: 8
"##;
        let config = ServiceConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.feed.user_agent, "my-dashboard (me@example.com)");
        assert_eq!(config.feed.base_url, "https://api.weather.gov");
        assert_eq!(config.updater.base_max_total_zones, 300);
        assert_eq!(config.updater.batch_size, 24);
        assert_eq!(config.style.severe, "#ff0000");
        assert!(config.performance);
        assert_eq!(config.warm_viewport().map(|v| v.zoom), Some(8));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ServiceConfig::from_yaml_str("refresh_interval_secs: 0").is_err());
        assert!(ServiceConfig::from_yaml_str("style:\n  minor: blue").is_err());
        let bad_warm = "warm_viewport:\n  bbox: \"nope\"\n  zoom: 5";
        assert!(ServiceConfig::from_yaml_str(bad_warm).is_err());
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "refresh_interval_secs: 120\noverlay_concurrency: 4").unwrap();

        let config = ServiceConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_secs(120));
        assert_eq!(config.overlay_concurrency, 4);

        assert!(ServiceConfig::load(Some(Path::new("/nonexistent/alerts.yaml"))).is_err());
        assert_eq!(ServiceConfig::load(None).unwrap(), ServiceConfig::default());
    }
}
