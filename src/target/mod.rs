//! Target addressing subsystem.
//!
//! # Data Flow
//! ```text
//! user input / url= parameter
//!     → normalizer.rs (trim, canonicalize, bare domain, search fallback)
//!     → absolute http(s) target
//!     → proxy_url.rs (wrap as {gateway}/proxy?url=..., unwrap)
//!
//! display.rs renders targets for people (favicon, domain label, title).
//! ```

pub mod display;
pub mod normalizer;
pub mod proxy_url;

pub use normalizer::Normalizer;
pub use proxy_url::{resolve_target, GatewayOrigin, ProxyUrl, PROXY_PATH, TARGET_PARAM};
