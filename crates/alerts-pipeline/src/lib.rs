//! Alert draw pipeline.
//!
//! Turns the NWS active-alerts feed into map-ready shapes:
//! - `feed`: active alerts and point queries
//! - `zones`: lazy, cached zone geometry for alerts without their own polygon
//! - `builder`: viewport-filtered, simplified draw features under zone caps
//! - `updater`: base pass plus targeted boost passes, merged by feature id
//! - `filter`/`store`: the full alert list the sidebar shows
//! - `overlay`: one shape per zone, shared by every alert that names it

pub mod builder;
pub mod draw;
pub mod feed;
pub mod filter;
pub mod overlay;
pub mod sampler;
pub mod store;
pub mod timing;
pub mod updater;
pub mod zones;

pub use builder::{BuildMode, BuildOptions, BuildReport, DrawFeatureBuilder};
pub use draw::{
    base_alert_id, zone_feature_id, DrawFeature, GeometrySource, ZONE_ID_SEPARATOR,
};
pub use feed::{build_http_client, AlertSource, FeedConfig, NwsFeedClient};
pub use filter::{latest, AlertFilter, SeverityCounts, SidebarSummary};
pub use overlay::{OverlayFeature, OverlaySet, ZoneOverlayBuilder};
pub use sampler::{ViewportSampler, DEFAULT_SAMPLE_THROTTLE};
pub use store::{AlertStore, RecentAlert, RefreshOutcome, StatusKind, StatusLine};
pub use timing::{Clock, Debouncer, ManualClock, SystemClock, Throttle, ThrottleDecision};
pub use updater::{
    merge_by_id, DrawOutcome, DrawRequest, DrawUpdater, FocusTarget, UpdaterConfig,
};
pub use zones::{HttpZoneFetcher, ZoneFetcher, ZoneResolver};
