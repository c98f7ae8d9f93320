//! NWS alerts API library.
//!
//! Serves the filtered alert list and map-ready alert shapes for any
//! viewport, backed by a periodically refreshed feed and shared zone caches.

pub mod config;
pub mod error;
pub mod handlers;
pub mod refresher;
pub mod server;
pub mod state;

pub use config::ServiceConfig;
pub use error::{ApiError, ApiResult};
pub use refresher::Refresher;
pub use server::create_router;
pub use state::{AppState, CacheReport};
