//! Header manipulation on both sides of the gateway.
//!
//! # Responsibilities
//! - Select the allow-listed client headers forwarded to the origin
//! - Strip hop-by-hop headers from origin responses
//! - Remove framing policies that would block embedding
//! - Add permissive CORS
//!
//! # Design Decisions
//! - Outbound is an allow-list, never a deny-list: `host`, hop-by-hop and
//!   gateway-internal headers cannot leak by omission
//! - Inbound keeps every origin header not explicitly removed, including all
//!   `Set-Cookie` values

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Client headers forwarded to the origin. Changing this list changes what
/// origins see; cover any addition with a test.
pub static FORWARDED_REQUEST_HEADERS: [HeaderName; 8] = [
    header::USER_AGENT,
    header::ACCEPT,
    header::ACCEPT_LANGUAGE,
    header::COOKIE,
    header::REFERER,
    header::RANGE,
    header::CONTENT_TYPE,
    header::ORIGIN,
];

/// Connection-scoped headers owned by each hop's HTTP framing.
static HOP_BY_HOP_HEADERS: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::TRANSFER_ENCODING,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
];

/// Origin framing policies that would stop the page rendering in a frame.
static FRAMING_HEADERS: [HeaderName; 4] = [
    header::X_FRAME_OPTIONS,
    HeaderName::from_static("frame-options"),
    header::CONTENT_SECURITY_POLICY,
    header::CONTENT_SECURITY_POLICY_REPORT_ONLY,
];

/// Payload headers describing bytes the HTML rewriter no longer emits.
static REWRITTEN_PAYLOAD_HEADERS: [HeaderName; 4] = [
    header::CONTENT_LENGTH,
    HeaderName::from_static("content-md5"),
    HeaderName::from_static("content-digest"),
    header::ETAG,
];

/// Which response branch the headers belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyTreatment {
    /// Bytes forwarded unmodified.
    Passthrough,
    /// Bytes rewritten by the HTML pipeline.
    Rewritten,
}

/// Build the outbound header set from the inbound one.
///
/// Only the first value of each allowed header is kept.
pub fn filter_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(FORWARDED_REQUEST_HEADERS.len());
    for name in FORWARDED_REQUEST_HEADERS.iter() {
        if let Some(value) = inbound.get(name) {
            outbound.insert(name.clone(), value.clone());
        }
    }
    outbound
}

/// Sanitize origin response headers for the client.
pub fn sanitize_response_headers(origin: &HeaderMap, treatment: BodyTreatment) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(origin.len() + 1);

    // `HeaderMap::iter` yields every value, so repeated Set-Cookie survive.
    for (name, value) in origin.iter() {
        if HOP_BY_HOP_HEADERS.contains(name) || FRAMING_HEADERS.contains(name) {
            continue;
        }
        if treatment == BodyTreatment::Rewritten && REWRITTEN_PAYLOAD_HEADERS.contains(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers
}
