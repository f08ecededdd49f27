//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build shared state (outbound client, normalizer, navigation store)
//! - Create the Axum router with all handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Serve until the shutdown signal fires, then drain

use std::sync::Arc;

use axum::http::{HeaderMap, Uri};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{GatewayConfig, StorageConfig};
use crate::error::StartupError;
use crate::http::request::{make_span, propagate_request_id_layer, set_request_id_layer};
use crate::http::{api, health, proxy};
use crate::lifecycle::ShutdownSignal;
use crate::rewrite::RewritePool;
use crate::storage::{MemoryStore, NavigationStore};
use crate::target::{GatewayOrigin, Normalizer, PROXY_PATH};
use crate::upstream::OriginFetcher;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: OriginFetcher,
    pub normalizer: Arc<Normalizer>,
    /// Fixed origin for proxy URLs; derived per request when unset.
    pub public_origin: Option<GatewayOrigin>,
    pub navigation: Arc<NavigationStore<MemoryStore>>,
    pub rewriters: RewritePool,
}

impl AppState {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, StartupError> {
        let public_origin = config
            .proxy
            .public_origin
            .as_deref()
            .map(|o| GatewayOrigin::parse(o).map_err(|e| StartupError::PublicOrigin(o.to_string(), e)))
            .transpose()?;

        Ok(Self {
            fetcher: OriginFetcher::new(&config.proxy, config.timeouts.origin_head())?,
            normalizer: Arc::new(Normalizer::new(config.proxy.search_url.clone())),
            public_origin,
            navigation: Arc::new(open_navigation_store(&config.storage)?),
            rewriters: RewritePool::new(
                config.proxy.rewrite_workers,
                config.proxy.stream_buffer_chunks,
            ),
        })
    }

    /// Origin to build proxy URLs on for this request.
    pub fn gateway_origin(&self, headers: &HeaderMap, uri: &Uri) -> Option<GatewayOrigin> {
        self.public_origin
            .clone()
            .or_else(|| GatewayOrigin::from_request(headers, uri))
    }
}

fn open_navigation_store(
    config: &StorageConfig,
) -> Result<NavigationStore<MemoryStore>, StartupError> {
    let kv = match &config.snapshot_path {
        Some(path) => MemoryStore::load_from_file(path)?,
        None => MemoryStore::new(),
    };
    Ok(NavigationStore::new(kv, config.history_limit))
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let state = AppState::from_config(&config)?;
        Ok(Self {
            router: Self::build_router(&config, state),
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The origin fetch carries its own head timeout; the router timeout is a
    /// longer backstop. Neither bounds streamed bodies, which run until the
    /// origin finishes or the client leaves.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route(PROXY_PATH, get(proxy::proxy_handler))
            .route("/health", get(health::health_handler))
            .route(
                "/api/history",
                get(api::get_history)
                    .post(api::add_history)
                    .delete(api::clear_history),
            )
            .route(
                "/api/bookmarks",
                get(api::get_bookmarks)
                    .post(api::toggle_bookmark)
                    .delete(api::remove_bookmark),
            )
            .with_state(state)
            .layer(TimeoutLayer::new(config.timeouts.backstop()))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(set_request_id_layer())
    }

    #[cfg(test)]
    fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` resolves.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownSignal) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.recv())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
