//! Content presenter.
//!
//! Serves documents from the content service under human-readable site URLs.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ proxy dispatch ──────────────────────▶ proxy upstream
//!                          │
//!                          ▼
//!                    presentation pipeline
//!                          │
//!          ┌───────────────┼────────────────┐
//!          ▼               ▼                ▼
//!      routing         backend gateway     renderer
//!   (table, revision)  (mapping, content,  (minijinja)
//!                       layout services)
//!
//!     Cross-cutting: config (+ hot reload), lifecycle, observability
//! ```

use std::path::PathBuf;

use clap::Parser;

use presenter::lifecycle::startup;
use presenter::observability::logging;

#[derive(Parser)]
#[command(name = "presenter")]
#[command(about = "Presents content service documents under site URLs", long_about = None)]
struct Args {
    /// Configuration file (TOML). Defaults plus environment when omitted.
    #[arg(short, long, env = "PRESENTER_CONFIG")]
    config: Option<PathBuf>,

    /// Routing table file (JSON or TOML); overrides `routing.path`.
    #[arg(short, long)]
    routes: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = startup::load(args.config.as_deref(), args.routes)?;
    logging::init(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "presenter starting");

    startup::run(config).await
}
