//! Error responses.
//!
//! Every failure leaves the proxy as `{"error": "<message>"}` with a status
//! derived from the error class.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::upstream::UpstreamError;

/// Error returned by route handlers.
#[derive(Debug)]
pub enum ApiError {
    /// A path parameter could not be interpreted.
    BadRequest(String),
    Upstream(UpstreamError),
    /// The request ran past the overall deadline.
    Timeout(Duration),
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(error) => match error {
                UpstreamError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                UpstreamError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
                UpstreamError::Transport(_)
                | UpstreamError::Parse(_)
                | UpstreamError::MalformedResponse { .. } => StatusCode::BAD_GATEWAY,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(message) | ApiError::Internal(message) => message.clone(),
            ApiError::Timeout(deadline) => {
                format!("request exceeded the {}s deadline", deadline.as_secs())
            }
            ApiError::Upstream(error) => error.to_string(),
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(error: UpstreamError) -> Self {
        ApiError::Upstream(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = %status, error = %self.message(), "Request failed");
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::BadRequest("bad date".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::Timeout(Duration::from_secs(90)),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                UpstreamError::malformed("holiday", "x").into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                UpstreamError::Parse("eof".into()).into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                UpstreamError::UpstreamUnavailable {
                    endpoint: "pre_market",
                    attempts: 2,
                    reason: "timed out".into(),
                }
                .into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                UpstreamError::Session("tls".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{:?}", error);
        }
    }

    #[tokio::test]
    async fn test_body_is_error_object() {
        let response = ApiError::BadRequest("invalid date '2024-01-01'".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({"error": "invalid date '2024-01-01'"}));
    }
}
