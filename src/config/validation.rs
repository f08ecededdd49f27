//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Validate addresses and URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: '{value}' is not an absolute http(s) URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("proxy.public_origin: '{0}' must not carry a path, query or fragment")]
    OriginWithPath(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Validate a loaded configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if let Some(origin) = &config.proxy.public_origin {
        match Url::parse(origin) {
            Ok(url) if is_http(&url) => {
                if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
                    errors.push(ValidationError::OriginWithPath(origin.clone()));
                }
            }
            _ => errors.push(ValidationError::InvalidUrl {
                field: "proxy.public_origin",
                value: origin.clone(),
            }),
        }
    }

    match Url::parse(&config.proxy.search_url) {
        Ok(url) if is_http(&url) => {}
        _ => errors.push(ValidationError::InvalidUrl {
            field: "proxy.search_url",
            value: config.proxy.search_url.clone(),
        }),
    }

    if config.proxy.connect_timeout_secs == 0 {
        errors.push(ValidationError::Zero("proxy.connect_timeout_secs"));
    }
    if config.proxy.stream_buffer_chunks == 0 {
        errors.push(ValidationError::Zero("proxy.stream_buffer_chunks"));
    }
    if config.proxy.rewrite_workers == Some(0) {
        errors.push(ValidationError::Zero("proxy.rewrite_workers"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.storage.history_limit == 0 {
        errors.push(ValidationError::Zero("storage.history_limit"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
