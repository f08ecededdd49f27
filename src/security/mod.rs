//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound client request:
//!     → headers.rs (allow-list filter) → origin
//!
//! Origin response:
//!     → headers.rs (strip hop-by-hop and framing policy, add CORS) → client
//! ```

pub mod headers;

pub use headers::{filter_request_headers, sanitize_response_headers, BodyTreatment};
