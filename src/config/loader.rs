//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::PresenterConfig;
use crate::config::validation::{validate_config, validate_routing_table, ValidationError};
use crate::routing::RoutingTable;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load a TOML configuration file, apply environment overrides and validate.
pub fn load_config(path: &Path) -> Result<PresenterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: PresenterConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables on a parsed config.
///
/// `lookup` returns the value of a variable, if set.
pub fn apply_env_overrides<F>(config: &mut PresenterConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("MAPPING_SERVICE_URL") {
        config.services.mapping_url = Some(url);
    }
    if let Some(url) = lookup("CONTENT_SERVICE_URL") {
        config.services.content_url = url;
    }
    if let Some(url) = lookup("LAYOUT_SERVICE_URL") {
        config.services.layout_url = url;
    }
    if let Some(domain) = lookup("PRESENTED_URL_DOMAIN") {
        config.presentation.presented_url_domain = Some(domain).filter(|d| !d.is_empty());
    }
    if let Some(proto) = lookup("PRESENTED_URL_PROTO") {
        config.presentation.presented_url_proto = proto;
    }
    if let Some(flag) = lookup("STAGING_MODE") {
        config.presentation.staging_mode = matches!(flag.to_ascii_lowercase().as_str(), "true" | "1" | "yes");
    }
    if let Some(path) = lookup("CONTENT_MAP") {
        config.routing.path = Some(path.into());
    }
    if let Some(path) = lookup("TEMPLATES_PATH") {
        config.templates.path = Some(path).filter(|p| !p.is_empty()).map(Into::into);
    }
    if let Some(level) = lookup("PRESENTER_LOG_LEVEL") {
        config.observability.log_level = level;
    }
}

/// Load and validate a routing table. `.toml` files are TOML, anything else JSON.
pub fn load_routing_table(path: &Path) -> Result<RoutingTable, ConfigError> {
    let content = fs::read_to_string(path)?;

    let table: RoutingTable = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content)?,
        _ => serde_json::from_str(&content)?,
    };

    validate_routing_table(&table).map_err(ConfigError::Validation)?;
    Ok(table)
}
