//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the presenter.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the presenter.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PresenterConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Base URLs of the backend services.
    pub services: ServicesConfig,

    /// How presented URLs are derived from requests.
    pub presentation: PresentationConfig,

    /// Routing table source.
    pub routing: RoutingConfig,

    /// On-disk templates.
    pub templates: TemplatesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

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

/// Backend service endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Mapping service, consulted when the routing table has no match.
    pub mapping_url: Option<String>,

    /// Content service (documents, assets, search, control SHA).
    pub content_url: String,

    /// Layout service (page and error templates).
    pub layout_url: String,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            mapping_url: None,
            content_url: "http://localhost:9000".to_string(),
            layout_url: "http://localhost:9001".to_string(),
        }
    }
}

/// Presented URL settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PresentationConfig {
    /// Host used for every presented URL instead of the request's Host header.
    pub presented_url_domain: Option<String>,

    /// Scheme of presented URLs.
    pub presented_url_proto: String,

    /// Serve revisioned content trees (`/{revision}/{domain}/...`).
    pub staging_mode: bool,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            presented_url_domain: None,
            presented_url_proto: "https".to_string(),
            staging_mode: false,
        }
    }
}

/// Routing table source.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Path to the routing table file (JSON or TOML).
    pub path: Option<PathBuf>,

    /// Reload the table when the file changes.
    pub watch: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            path: None,
            watch: true,
        }
    }
}

/// On-disk template directory.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Root holding `_default/` and per-domain subdirectories.
    pub path: Option<PathBuf>,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Timeout for a single backend call in seconds.
    pub backend_secs: u64,

    /// Inbound request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn backend(&self) -> Duration {
        Duration::from_secs(self.backend_secs)
    }

    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            backend_secs: 10,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
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

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}
