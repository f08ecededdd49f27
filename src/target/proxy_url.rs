//! Gateway-relative proxy URLs.
//!
//! A proxy URL is `{gateway origin}/proxy?url=<percent-encoded target>`.
//! Wrapping and unwrapping are exact inverses for any absolute target.

use std::fmt;

use axum::http::{header, HeaderMap, Uri};
use url::Url;

/// Path of the proxy endpoint on the gateway.
pub const PROXY_PATH: &str = "/proxy";

/// Name of the query parameter carrying the target.
pub const TARGET_PARAM: &str = "url";

/// Scheme, host and port of this gateway as seen by clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOrigin(Url);

impl GatewayOrigin {
    /// Parse an origin; any path, query or fragment is discarded.
    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(input)?;
        Url::parse(&url.origin().ascii_serialization()).map(Self)
    }

    /// Derive the origin from an inbound request's authority and
    /// `X-Forwarded-Proto`.
    pub fn from_request(headers: &HeaderMap, uri: &Uri) -> Option<Self> {
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .or_else(|| uri.authority().map(|a| a.to_string()))?;

        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|p| matches!(*p, "http" | "https"))
            .or_else(|| uri.scheme_str())
            .unwrap_or("http");

        Self::parse(&format!("{scheme}://{host}")).ok()
    }

    /// Wrap an absolute target URL as a proxy URL on this origin.
    pub fn proxy_url(&self, target: &str) -> ProxyUrl {
        let mut url = self.0.clone();
        url.set_path(PROXY_PATH);
        url.query_pairs_mut()
            .clear()
            .append_pair(TARGET_PARAM, target);
        ProxyUrl(url)
    }

    /// True when `url` already points at this gateway's proxy endpoint.
    pub fn is_proxy_url(&self, url: &Url) -> bool {
        url.origin() == self.0.origin() && url.path() == PROXY_PATH
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// A URL on the gateway that encodes a target URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyUrl(Url);

impl ProxyUrl {
    /// The encoded target.
    pub fn target(&self) -> Option<String> {
        target_param(&self.0)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_string(self) -> String {
        self.0.into()
    }
}

impl fmt::Display for ProxyUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Extract the target from a proxy URL, absolute or gateway-relative
/// (`/proxy?url=...`).
pub fn resolve_target(proxy_url: &str) -> Option<String> {
    let url = match Url::parse(proxy_url) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse("http://gateway.local/").ok()?.join(proxy_url).ok()?
        }
        Err(_) => return None,
    };
    target_param(&url)
}

fn target_param(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == TARGET_PARAM)
        .map(|(_, v)| v.into_owned())
}
