//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Proxy pipeline settings (outbound client, URL handling, streaming).
    pub proxy: ProxyConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// History and bookmark store settings.
    pub storage: StorageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Proxy pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Public origin of this gateway (e.g., "https://gateway.example.com").
    ///
    /// When unset, the origin is derived per request from the `Host` header
    /// and `X-Forwarded-Proto`.
    pub public_origin: Option<String>,

    /// Search URL prefix used when the normalizer falls back to a query.
    /// The percent-encoded query is appended verbatim.
    pub search_url: String,

    /// Maximum number of redirects the fetcher follows.
    pub max_redirects: usize,

    /// Outbound connection timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Depth of the bounded channel between the rewriter and the client body,
    /// in chunks.
    pub stream_buffer_chunks: usize,

    /// Threads running HTML rewrites. Each thread multiplexes many pages;
    /// defaults to the number of available cores.
    pub rewrite_workers: Option<usize>,

    /// User-Agent sent when the client did not supply one.
    pub user_agent: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            public_origin: None,
            search_url: "https://www.google.com/search?q=".to_string(),
            max_redirects: 10,
            connect_timeout_secs: 10,
            stream_buffer_chunks: 16,
            rewrite_workers: None,
            user_agent: None,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed for the origin to send its response head, in seconds.
    /// A silent origin is reported as a fetch failure. Streaming bodies are
    /// not bounded by this.
    pub request_secs: u64,
}

impl TimeoutConfig {
    /// Slack added on top of `request_secs` for the router-level timeout,
    /// which only fires if a handler hangs outside the origin fetch.
    pub const BACKSTOP_GRACE_SECS: u64 = 5;

    pub fn origin_head(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn backstop(&self) -> Duration {
        Duration::from_secs(self.request_secs + Self::BACKSTOP_GRACE_SECS)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// History and bookmark store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Maximum number of history entries kept (most recent first).
    pub history_limit: usize,

    /// Optional JSON snapshot file. When set, the store is loaded from it at
    /// startup and rewritten after every change.
    pub snapshot_path: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_limit: 20,
            snapshot_path: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.proxy.max_redirects, 10);
        assert_eq!(config.storage.history_limit, 20);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
        assert!(config.proxy.public_origin.is_none());
        assert!(config.proxy.rewrite_workers.is_none());
        assert!(config.timeouts.backstop() > config.timeouts.origin_head());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [proxy]
            public_origin = "https://gw.example.com"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.proxy.public_origin.as_deref(), Some("https://gw.example.com"));
        assert_eq!(config.proxy.search_url, "https://www.google.com/search?q=");
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.timeouts.request_secs, 30);
    }
}
