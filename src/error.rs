//! Gateway error types and their JSON envelope.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::storage::StorageError;

/// Errors surfaced to clients before any response byte has been sent.
///
/// Once a body is streaming, failures can only end the stream early; they
/// never turn into one of these.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The `url` parameter is absent or empty.
    #[error("URL parameter is required")]
    MissingTarget,

    /// The `url` parameter does not normalize to an http(s) URL.
    #[error("Invalid URL parameter")]
    InvalidTarget(String),

    /// DNS, TLS, connect or protocol failure talking to the origin.
    #[error("Failed to fetch the requested URL")]
    UpstreamFetch(#[source] reqwest::Error),

    /// The origin accepted the request but sent no response head in time.
    #[error("Failed to fetch the requested URL")]
    UpstreamTimeout(Duration),

    /// A malformed request to the navigation API.
    #[error("{0}")]
    BadRequest(String),

    /// Navigation store failure.
    #[error("Storage error")]
    Storage(#[from] StorageError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingTarget
            | GatewayError::InvalidTarget(_)
            | GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::UpstreamFetch(_)
            | GatewayError::UpstreamTimeout(_)
            | GatewayError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// JSON envelope shared by every API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            GatewayError::UpstreamFetch(e) => {
                tracing::error!(error = %e, "Proxy fetch failed");
                crate::observability::metrics::record_upstream_failure();
            }
            GatewayError::UpstreamTimeout(waited) => {
                tracing::error!(waited_ms = waited.as_millis() as u64, "Origin sent no response head");
                crate::observability::metrics::record_upstream_failure();
            }
            GatewayError::Storage(e) => tracing::error!(error = %e, "Navigation store failed"),
            GatewayError::InvalidTarget(raw) => {
                tracing::debug!(target_url = %raw, "Rejected invalid target")
            }
            _ => {}
        }

        (self.status(), Json(ApiResponse::failure(self.to_string()))).into_response()
    }
}

/// Failures while assembling the server from configuration.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build outbound HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to open navigation store: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid public origin {0:?}: {1}")]
    PublicOrigin(String, #[source] url::ParseError),
}

/// Result type for gateway handlers.
pub type Result<T> = std::result::Result<T, GatewayError>;
