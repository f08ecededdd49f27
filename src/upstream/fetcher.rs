//! Outbound origin fetch.
//!
//! # Responsibilities
//! - Issue one GET per proxy request with the filtered headers
//! - Follow redirect chains inside the client
//! - Hand back status, headers, final URL and an unread body stream
//!
//! # Design Decisions
//! - Single attempt, no retries: failures surface to the caller immediately
//! - The wait for the response head is bounded; a silent origin is a fetch
//!   failure, not a hung request
//! - The client is shared across requests for connection pooling; no
//!   request data lives in it
//! - The body is never collected; it is a stream the caller consumes once

use std::io;
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use futures_util::stream::{BoxStream, StreamExt};
use reqwest::redirect::Policy;
use url::Url;

use crate::config::ProxyConfig;
use crate::error::GatewayError;

/// Lazy origin body. Dropping it aborts the transfer.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// A target plus the client headers selected for forwarding.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    target: Url,
    headers: HeaderMap,
}

impl ProxyRequest {
    /// Only http(s) targets can be fetched; anything else is an invalid request.
    pub fn new(target: Url, headers: HeaderMap) -> Result<Self, GatewayError> {
        if !matches!(target.scheme(), "http" | "https") {
            return Err(GatewayError::InvalidTarget(target.into()));
        }
        Ok(Self { target, headers })
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// The origin's answer, body still unread.
pub struct OriginResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// URL after redirects; relative links resolve against it.
    pub final_url: Url,
    pub body: ByteStream,
}

impl std::fmt::Debug for OriginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OriginResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("final_url", &self.final_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Fetches targets from origins.
#[derive(Clone)]
pub struct OriginFetcher {
    client: reqwest::Client,
    head_timeout: Duration,
}

impl OriginFetcher {
    /// Build the outbound client from configuration. `head_timeout` bounds the
    /// wait for the origin's response head, redirects included.
    pub fn new(config: &ProxyConfig, head_timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .redirect(Policy::limited(config.max_redirects))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));

        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        Ok(Self {
            client: builder.build()?,
            head_timeout,
        })
    }

    /// Issue the request. Only the response head is awaited here.
    pub async fn fetch(&self, request: ProxyRequest) -> Result<OriginResponse, GatewayError> {
        let ProxyRequest { target, headers } = request;

        tracing::debug!(target_url = %target, "Fetching from origin");

        let send = self.client.get(target).headers(headers).send();
        let response = tokio::time::timeout(self.head_timeout, send)
            .await
            .map_err(|_| GatewayError::UpstreamTimeout(self.head_timeout))?
            .map_err(GatewayError::UpstreamFetch)?;

        let status = response.status();
        let headers = response.headers().clone();
        let final_url = response.url().clone();

        tracing::debug!(
            status = %status,
            final_url = %final_url,
            "Origin responded"
        );

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(io::Error::other))
            .boxed();

        Ok(OriginResponse {
            status,
            headers,
            final_url,
            body,
        })
    }
}
