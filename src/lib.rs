//! Prism gateway library.
//!
//! A transparent HTTP(S) proxy that lets arbitrary pages be embedded and
//! navigated inside a host application. HTML is rewritten as it streams so
//! every link and subresource routes back through `/proxy`; everything else
//! passes through byte for byte.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;
pub mod security;
pub mod storage;
pub mod target;
pub mod upstream;

pub use config::GatewayConfig;
pub use error::{GatewayError, StartupError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
