//! HTTP mapping for worker errors.
//!
//! The gateway surfaces worker failures as plain-text HTTP responses;
//! the offline case (no network and no cached root document) is 503.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shelter_core::Error;

/// Wrapper giving core errors an HTTP representation.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct GatewayError(#[from] pub Error);

impl GatewayError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::CacheMiss(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::InvalidInput(_) | Error::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            Error::Network(_) => StatusCode::BAD_GATEWAY,
            Error::FetchTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Database(_) | Error::MigrationFailed(_) | Error::Manifest(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(status = status.as_u16(), error = %self.0, "request failed");
        (status, self.0.to_string()).into_response()
    }
}
