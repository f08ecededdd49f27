//! HTML rewrite subsystem.
//!
//! # Data Flow
//! ```text
//! origin body stream (ByteStream)
//!     → stream.rs (task pinned to a RewritePool thread: pull chunk, feed
//!       rewriter, flush output)
//!     → html.rs (lol_html tokenizer + handlers, one per rules.rs row)
//!         head            → bootstrap.rs script, injected once
//!         a/img/link/...  → rules.rs resolve + proxy-wrap
//!     → bounded channel → client body
//! ```
//!
//! # Design Decisions
//! - One `RewriteContext` per request, passed by value; no globals
//! - Attribute failures are `TransformFault`s: counted, logged, and the
//!   attribute is left as the origin sent it
//! - The whole document is never held in memory

pub mod bootstrap;
pub mod html;
pub mod rules;
pub mod stream;

use thiserror::Error;
use url::Url;

use crate::target::GatewayOrigin;

pub use html::{PageRewriter, RewriteSummary};
pub use rules::{AttributeKind, RewriteRule, REWRITE_RULES};
pub use stream::RewritePool;

/// Everything the rewriter needs to know about the current request.
#[derive(Debug, Clone)]
pub struct RewriteContext {
    /// URL of the page being rewritten (after redirects). Also the initial
    /// base URL for relative references.
    pub page_url: Url,
    /// Origin proxy URLs are built on.
    pub gateway: GatewayOrigin,
}

impl RewriteContext {
    pub fn new(page_url: Url, gateway: GatewayOrigin) -> Self {
        Self { page_url, gateway }
    }
}

/// A single attribute that could not be rewritten.
#[derive(Debug, Error)]
pub enum TransformFault {
    #[error("value has a malformed scheme")]
    MalformedScheme,

    #[error("value does not resolve against the base URL: {0}")]
    Unresolvable(#[source] url::ParseError),
}

impl TransformFault {
    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            TransformFault::MalformedScheme => "malformed_scheme",
            TransformFault::Unresolvable(_) => "unresolvable",
        }
    }
}
