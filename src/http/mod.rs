//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, graceful shutdown)
//!     → request.rs (request ID assigned, tracing span opened)
//!     → proxy.rs (url= → Normalizer → header filter → OriginFetcher)
//!     → response.rs (dispatch: HTML rewrite | passthrough, sanitize headers)
//!     → Send to client
//!
//! api.rs and health.rs serve the navigation store and liveness.
//! ```

pub mod api;
pub mod health;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
