//! Common types shared across the weather-alerts crates and services.

pub mod alert;
pub mod bbox;
pub mod error;
pub mod geometry;
pub mod severity;
pub mod zone;

pub use alert::{Alert, AlertKind, DrawSource};
pub use bbox::BoundingBox;
pub use error::{AlertError, AlertResult};
pub use geometry::{AlertGeometry, Position, Ring};
pub use severity::Severity;
pub use zone::Zone;
