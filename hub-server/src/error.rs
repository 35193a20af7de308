//! Error types for hub-server.

use crate::models::ModelError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// HTTP-facing service errors.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<hub_common::Error> for HubError {
    fn from(err: hub_common::Error) -> Self {
        use hub_common::Error as E;
        match err {
            E::InvalidInput(msg) => HubError::InvalidRequest(msg),
            E::UnsupportedMediaType(msg) => HubError::UnsupportedMediaType(msg),
            E::PayloadTooLarge(msg) => HubError::PayloadTooLarge(msg),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for HubError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            HubError::PayloadTooLarge(err.body_text())
        } else {
            HubError::InvalidRequest(err.body_text())
        }
    }
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            HubError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            HubError::UnsupportedMediaType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA_TYPE")
            }
            HubError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            HubError::ModelUnavailable(_) | HubError::Model(ModelError::Unavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "MODEL_UNAVAILABLE")
            }
            HubError::Model(_) => (StatusCode::BAD_GATEWAY, "MODEL_ERROR"),
            HubError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = serde_json::json!({
            "success": false,
            "error": ApiError {
                code: code.to_string(),
                message: self.to_string(),
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HubError::from(hub_common::Error::UnsupportedMediaType(
            "Please upload a JPEG or PNG image.".into(),
        ));
        assert_eq!(err.to_string(), "Please upload a JPEG or PNG image.");
        let err = HubError::from(ModelError::Request("connection refused".into()));
        assert_eq!(err.to_string(), "Model request failed: connection refused");
    }

    #[test]
    fn test_error_into_response() {
        let cases = [
            (HubError::InvalidRequest("missing message".into()), StatusCode::BAD_REQUEST),
            (
                HubError::UnsupportedMediaType("gif".into()),
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ),
            (HubError::PayloadTooLarge("10 MiB".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (HubError::ModelUnavailable("classifier".into()), StatusCode::SERVICE_UNAVAILABLE),
            (
                HubError::Model(ModelError::Unavailable("chat".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                HubError::Model(ModelError::Api { status: 500, message: "x".into() }),
                StatusCode::BAD_GATEWAY,
            ),
            (HubError::Internal("oops".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_from_shared_error_keeps_status() {
        let cases = [
            hub_common::Error::InvalidInput("empty upload".into()),
            hub_common::Error::UnsupportedMediaType("gif".into()),
            hub_common::Error::PayloadTooLarge("image".into()),
        ];

        for err in cases {
            let expected = err.status_code();
            let status = HubError::from(err).into_response().status();
            assert_eq!(status.as_u16(), expected);
        }
    }
}
