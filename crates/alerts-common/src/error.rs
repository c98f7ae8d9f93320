//! Error types for weather-alerts crates.

use thiserror::Error;

/// Result type alias using AlertError.
pub type AlertResult<T> = Result<T, AlertError>;

/// Primary error type for alert pipeline operations.
#[derive(Debug, Error)]
pub enum AlertError {
    // === Request Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid bbox: {0}")]
    InvalidBbox(String),

    #[error("Alert not found: {0}")]
    AlertNotFound(String),

    // === Upstream Errors ===
    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Upstream returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("Invalid alert feed: {0}")]
    InvalidFeed(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    // === Infrastructure Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Request timeout")]
    Timeout,
}

impl AlertError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            AlertError::MissingParameter(_)
            | AlertError::InvalidParameter { .. }
            | AlertError::InvalidBbox(_) => 400,

            AlertError::AlertNotFound(_) => 404,

            AlertError::Upstream(_)
            | AlertError::UpstreamStatus { .. }
            | AlertError::InvalidFeed(_) => 502,

            AlertError::Timeout => 504,

            _ => 500,
        }
    }
}

impl From<serde_json::Error> for AlertError {
    fn from(err: serde_json::Error) -> Self {
        AlertError::InvalidFeed(format!("JSON error: {}", err))
    }
}

impl From<crate::bbox::BboxParseError> for AlertError {
    fn from(err: crate::bbox::BboxParseError) -> Self {
        AlertError::InvalidBbox(err.to_string())
    }
}
