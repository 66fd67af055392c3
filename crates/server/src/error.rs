//! Pipeline error to HTTP response mapping
//!
//! Every handler returns `Result<_, ApiError>` so the status code and
//! response envelope for each error variant are decided in exactly one
//! place.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use nyaya_core::Error;

/// Wrapper turning a pipeline error into a JSON error envelope
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            Error::Validation(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": message }),
            ),
            Error::RetryableUnavailable { wait_hint_secs } => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "success": false,
                    "error": self.0.to_string(),
                    "retry_after_secs": wait_hint_secs,
                }),
            ),
            Error::Upstream { .. } => (
                StatusCode::BAD_GATEWAY,
                json!({
                    "success": false,
                    "error": "Upstream service error",
                    "details": self.0.to_string(),
                }),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "success": false,
                    "error": "Internal server error",
                    "details": self.0.to_string(),
                }),
            ),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_400() {
        let response = ApiError(Error::Validation("No question provided".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_retryable_maps_to_503() {
        let response =
            ApiError(Error::RetryableUnavailable { wait_hint_secs: 25 }).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_upstream_maps_to_502() {
        let response = ApiError(Error::Upstream {
            status: 429,
            body: "rate limited".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_everything_else_maps_to_500() {
        for err in [
            Error::Conversion("bad header".into()),
            Error::Network("connection reset".into()),
            Error::Storage("disk full".into()),
            Error::Internal("missing prompt".into()),
        ] {
            let response = ApiError(err).into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
