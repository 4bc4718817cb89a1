//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGTERM / SIGINT (graceful shutdown)
//! - Reload the routing table on SIGHUP
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - SIGHUP triggers a routing table reload, not shutdown
//! - A failed reload keeps the current table

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::load_routing_table;
use crate::observability::metrics;
use crate::routing::ContentRouter;

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}

/// Reload `path` into `router` on every SIGHUP until shutdown.
#[cfg(unix)]
pub fn spawn_reload_on_sighup(
    router: Arc<ContentRouter>,
    path: PathBuf,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(hangup) => hangup,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGHUP handler");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = hangup.recv() => {
                    tracing::info!(path = ?path, "SIGHUP received, reloading routing table");
                    reload_from(&router, &path);
                }
                _ = shutdown.recv() => break,
            }
        }
    })
}

#[cfg(not(unix))]
pub fn spawn_reload_on_sighup(
    _router: Arc<ContentRouter>,
    _path: PathBuf,
    _shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async {})
}

fn reload_from(router: &ContentRouter, path: &std::path::Path) {
    match load_routing_table(path) {
        Ok(table) => {
            router.reload(table);
            metrics::record_reload("success");
        }
        Err(e) => {
            metrics::record_reload("error");
            tracing::error!(error = %e, "Failed to reload routing table. Keeping current table.");
        }
    }
}
