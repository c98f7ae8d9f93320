//! Mapping of pipeline errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use alerts_common::AlertError;

pub type ApiResult<T> = Result<T, ApiError>;

/// An [`AlertError`] rendered as `{"error": ..., "status": ...}`.
#[derive(Debug)]
pub struct ApiError(pub AlertError);

impl From<AlertError> for ApiError {
    fn from(err: AlertError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!(error = %self.0, status = status.as_u16(), "Request failed");
        }

        (
            status,
            Json(json!({
                "error": self.0.to_string(),
                "status": status.as_u16(),
            })),
        )
            .into_response()
    }
}
