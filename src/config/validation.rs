//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check routing prefixes and proxy upstreams
//! - Check the template directory exists
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PresenterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config or a routing table is accepted into the system

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::config::schema::PresenterConfig;
use crate::routing::RoutingTable;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: {value:?} is not an absolute http(s) URL")]
    InvalidServiceUrl { field: &'static str, value: String },

    #[error("{field}: {path:?} is not a directory")]
    NotADirectory { field: &'static str, path: PathBuf },

    #[error("{field}: must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("{domain}: prefix {prefix:?} must be empty or start with '/'")]
    InvalidPrefix { domain: String, prefix: String },

    #[error("{domain}: proxy upstream {upstream:?} for {prefix:?} is not an absolute http:// URL")]
    InvalidUpstream {
        domain: String,
        prefix: String,
        upstream: String,
    },
}

pub fn validate_config(config: &PresenterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if let Some(mapping) = &config.services.mapping_url {
        check_service_url(&mut errors, "services.mapping_url", mapping);
    }
    check_service_url(&mut errors, "services.content_url", &config.services.content_url);
    check_service_url(&mut errors, "services.layout_url", &config.services.layout_url);

    if let Some(path) = &config.templates.path {
        if !path.is_dir() {
            errors.push(ValidationError::NotADirectory {
                field: "templates.path",
                path: path.clone(),
            });
        }
    }

    for (field, secs) in [
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.backend_secs", config.timeouts.backend_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ] {
        if secs == 0 {
            errors.push(ValidationError::ZeroTimeout { field });
        }
    }

    finish(errors)
}

pub fn validate_routing_table(table: &RoutingTable) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (domain, routes) in table.domains() {
        let prefixes = routes.content.keys().chain(routes.proxy.keys());
        for prefix in prefixes {
            if !prefix.is_empty() && !prefix.starts_with('/') {
                errors.push(ValidationError::InvalidPrefix {
                    domain: domain.to_string(),
                    prefix: prefix.clone(),
                });
            }
        }

        for (prefix, upstream) in &routes.proxy {
            let plain_http = Url::parse(upstream)
                .map(|url| url.scheme() == "http" && url.has_host())
                .unwrap_or(false);
            if !plain_http {
                errors.push(ValidationError::InvalidUpstream {
                    domain: domain.to_string(),
                    prefix: prefix.clone(),
                    upstream: upstream.clone(),
                });
            }
        }
    }

    finish(errors)
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_service_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let ok = Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false);
    if !ok {
        errors.push(ValidationError::InvalidServiceUrl {
            field,
            value: value.to_string(),
        });
    }
}

fn finish(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
