//! Upstream (origin) subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyRequest (normalized target + filtered headers)
//!     → fetcher.rs (reqwest GET, redirects followed)
//!     → OriginResponse (status, headers, final URL, lazy body)
//!     → content dispatch in http/response.rs
//! ```

pub mod fetcher;

pub use fetcher::{ByteStream, OriginFetcher, OriginResponse, ProxyRequest};
