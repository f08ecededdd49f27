//! Content dispatch and response assembly.
//!
//! # Responsibilities
//! - Decide per response whether the body is rewritten or passed through
//! - Sanitize origin headers for the chosen branch
//! - Stream the body to the client without buffering it
//!
//! # Design Decisions
//! - Only complete `text/html` documents are rewritten; everything else,
//!   including range responses (206 + `Content-Range`) of HTML, passes
//!   through byte for byte
//! - HTML with a non-identity `Content-Encoding` passes through as well:
//!   the tokenizer cannot read compressed bytes
//! - The origin status is kept on both branches

use axum::body::Body;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;

use crate::observability::metrics::{BRANCH_HTML, BRANCH_PASSTHROUGH};
use crate::rewrite::{RewriteContext, RewritePool};
use crate::security::{sanitize_response_headers, BodyTreatment};
use crate::target::GatewayOrigin;
use crate::upstream::OriginResponse;

/// How a response will be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Rewrite,
    Passthrough,
}

impl Branch {
    /// Pick the branch from the origin status and headers.
    pub fn for_response(status: StatusCode, headers: &HeaderMap) -> Self {
        if !is_html(headers) {
            return Branch::Passthrough;
        }
        if status == StatusCode::PARTIAL_CONTENT {
            tracing::debug!("Partial HTML response, forwarding without rewriting");
            return Branch::Passthrough;
        }
        if let Some(encoding) = content_encoding(headers) {
            tracing::warn!(
                content_encoding = encoding,
                "HTML response is encoded, forwarding without rewriting"
            );
            return Branch::Passthrough;
        }
        Branch::Rewrite
    }

    /// Metrics label.
    pub fn label(self) -> &'static str {
        match self {
            Branch::Rewrite => BRANCH_HTML,
            Branch::Passthrough => BRANCH_PASSTHROUGH,
        }
    }
}

/// Turn an origin response into the client response.
pub fn dispatch(
    origin: OriginResponse,
    gateway: GatewayOrigin,
    rewriters: &RewritePool,
) -> (Branch, Response) {
    let OriginResponse {
        status,
        headers,
        final_url,
        body,
    } = origin;

    let branch = Branch::for_response(status, &headers);
    let response = match branch {
        Branch::Rewrite => {
            let headers = sanitize_response_headers(&headers, BodyTreatment::Rewritten);
            let ctx = RewriteContext::new(final_url, gateway);
            let rewritten = rewriters.spawn(ctx, body);
            build(status, headers, Body::from_stream(rewritten))
        }
        Branch::Passthrough => {
            let headers = sanitize_response_headers(&headers, BodyTreatment::Passthrough);
            build(status, headers, Body::from_stream(body))
        }
    };
    (branch, response)
}

fn build(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Case-insensitive `text/html` check on `Content-Type`.
pub fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
}

fn content_encoding(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|e| !e.is_empty() && !e.eq_ignore_ascii_case("identity"))
}
