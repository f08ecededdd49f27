//! The `GET /proxy?url=` endpoint.
//!
//! # Responsibilities
//! - Extract and normalize the target
//! - Build the outbound request from the allow-listed client headers
//! - Fetch once, then hand off to the content dispatcher
//!
//! Errors before the origin answers become JSON envelopes; nothing after
//! that point can fail the response head.

use std::time::Instant;

use axum::extract::State;
use axum::http::{HeaderMap, Uri};
use axum::response::{IntoResponse, Response};
use url::{form_urlencoded, Url};

use crate::error::GatewayError;
use crate::http::request::request_id;
use crate::http::response::{dispatch, Branch};
use crate::http::server::AppState;
use crate::observability::metrics::{self, BRANCH_ERROR};
use crate::security::filter_request_headers;
use crate::target::TARGET_PARAM;
use crate::upstream::ProxyRequest;

pub async fn proxy_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let start = Instant::now();

    match forward(&state, &headers, &uri).await {
        Ok((branch, response)) => {
            tracing::info!(
                request_id = %request_id(&headers),
                status = response.status().as_u16(),
                branch = branch.label(),
                "Proxied"
            );
            metrics::record_request(branch.label(), response.status().as_u16(), start);
            response
        }
        Err(e) => {
            metrics::record_request(BRANCH_ERROR, e.status().as_u16(), start);
            e.into_response()
        }
    }
}

async fn forward(
    state: &AppState,
    headers: &HeaderMap,
    uri: &Uri,
) -> Result<(Branch, Response), GatewayError> {
    let raw = target_param(uri).unwrap_or_default();
    let normalized = state.normalizer.normalize(&raw);
    if normalized.is_empty() {
        return Err(GatewayError::MissingTarget);
    }
    let target = Url::parse(&normalized).map_err(|_| GatewayError::InvalidTarget(raw))?;

    let gateway = state
        .gateway_origin(headers, uri)
        .ok_or_else(|| GatewayError::BadRequest("Host header is required".to_string()))?;

    tracing::debug!(
        request_id = %request_id(headers),
        target_url = %target,
        "Proxying request"
    );

    let request = ProxyRequest::new(target, filter_request_headers(headers))?;
    let origin = state.fetcher.fetch(request).await?;

    Ok(dispatch(origin, gateway, &state.rewriters))
}

/// First `url` query parameter, percent-decoded.
fn target_param(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == TARGET_PARAM)
        .map(|(_, v)| v.into_owned())
}
