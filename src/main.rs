//! Prism gateway (v1)
//!
//! An embedding proxy built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────────┐
//!                              │                    PRISM GATEWAY                      │
//!                              │                                                       │
//!     GET /proxy?url=…         │  ┌─────────┐    ┌────────────┐    ┌──────────────┐   │
//!     ─────────────────────────┼─▶│  http   │───▶│   target   │───▶│   security   │   │
//!                              │  │ server  │    │ normalizer │    │header filter │   │
//!                              │  └─────────┘    └────────────┘    └──────┬───────┘   │
//!                              │                                         ▼           │
//!                              │                                  ┌──────────────┐   │
//!                              │                                  │   upstream   │◀──┼──── Origin
//!                              │                                  │   fetcher    │   │
//!                              │                                  └──────┬───────┘   │
//!                              │                          text/html ┌────┴────┐ other │
//!                              │                                    ▼         ▼       │
//!     Streamed response        │  ┌──────────┐            ┌──────────┐  ┌──────────┐  │
//!     ◀────────────────────────┼──│ sanitize │◀───────────│ rewrite  │  │passthru  │  │
//!                              │  │ headers  │◀───────────┴──────────┘  └──────────┘  │
//!                              │  └──────────┘                                        │
//!                              │                                                       │
//!                              │  config · observability · lifecycle · storage (API)  │
//!                              └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use prism_gateway::config::{load_config, GatewayConfig};
use prism_gateway::lifecycle::{wait_for_signal, Shutdown};
use prism_gateway::observability::{init_logging, init_metrics};
use prism_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "prism-gateway", version, about = "Embedding proxy with streaming HTML rewriting")]
struct Args {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability);

    tracing::info!("prism-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        public_origin = config.proxy.public_origin.as_deref().unwrap_or("<from Host header>"),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let mut serving = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut serving => return Ok(result??),
        _ = wait_for_signal() => {
            shutdown.trigger();
        }
    }
    serving.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
