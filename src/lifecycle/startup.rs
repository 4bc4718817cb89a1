//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration and the routing table
//! - Initialize metrics and the HTTP server
//! - Start background tasks (routing table watcher, SIGHUP reload)
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener binds last (traffic only when ready)

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::loader::apply_env_overrides;
use crate::config::validation::validate_config;
use crate::config::watcher::RoutingWatcher;
use crate::config::{load_config, load_routing_table, ConfigError, PresenterConfig};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::{shutdown_signal, spawn_reload_on_sighup};
use crate::observability::metrics;
use crate::routing::{ContentRouter, RoutingTable};

/// Load the config file, or defaults with environment overrides when no file is given.
pub fn load(config_path: Option<&Path>, routes: Option<PathBuf>) -> Result<PresenterConfig, ConfigError> {
    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => {
            let mut config = PresenterConfig::default();
            apply_env_overrides(&mut config, |key| std::env::var(key).ok());
            validate_config(&config).map_err(ConfigError::Validation)?;
            config
        }
    };

    if routes.is_some() {
        config.routing.path = routes;
    }
    Ok(config)
}

/// The configured routing table, or an empty one when none is configured.
pub fn initial_routing_table(config: &PresenterConfig) -> Result<RoutingTable, ConfigError> {
    match &config.routing.path {
        Some(path) => {
            let table = load_routing_table(path)?;
            tracing::info!(
                path = ?path,
                domains = table.domains().count(),
                "Routing table loaded"
            );
            Ok(table)
        }
        None => {
            tracing::warn!("No routing table configured, every page will be unmapped");
            Ok(RoutingTable::default())
        }
    }
}

/// Run the presenter until SIGINT or SIGTERM.
pub async fn run(config: PresenterConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        content_url = %config.services.content_url,
        layout_url = %config.services.layout_url,
        mapping_url = ?config.services.mapping_url,
        staging = config.presentation.staging_mode,
        "Configuration loaded"
    );

    let table = initial_routing_table(&config)?;
    let router = Arc::new(ContentRouter::new(table, config.presentation.staging_mode));

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?);
    }

    let shutdown = Shutdown::new();

    // Must stay alive for file events to keep arriving.
    let _watcher = match &config.routing.path {
        Some(path) => {
            spawn_reload_on_sighup(router.clone(), path.clone(), shutdown.subscribe());
            if config.routing.watch {
                let (watcher, updates) = RoutingWatcher::new(path);
                let guard = watcher.run()?;
                spawn_reload_task(router.clone(), updates, shutdown.subscribe());
                Some(guard)
            } else {
                None
            }
        }
        None => None,
    };

    let server = HttpServer::new(config.clone(), router)?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));
    serve_until(server_task, &shutdown, shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for the server task or `signal`, whichever ends first.
///
/// Either way every subscriber of `shutdown` is told to stop.
async fn serve_until<F>(
    mut server_task: JoinHandle<std::io::Result<()>>,
    shutdown: &Shutdown,
    signal: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: Future<Output = ()>,
{
    tokio::select! {
        finished = &mut server_task => {
            shutdown.trigger();
            finished??;
            tracing::warn!("HTTP server stopped without a shutdown signal");
        }
        _ = signal => {
            shutdown.trigger();
            server_task.await??;
        }
    }
    Ok(())
}

/// Apply tables delivered by the file watcher until shutdown.
fn spawn_reload_task(
    router: Arc<ContentRouter>,
    mut updates: tokio::sync::mpsc::UnboundedReceiver<RoutingTable>,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                table = updates.recv() => match table {
                    Some(table) => {
                        router.reload(table);
                        metrics::record_reload("success");
                    }
                    None => break,
                },
                _ = shutdown.recv() => break,
            }
        }
    })
}
