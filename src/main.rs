//! Edge request rewrite server.
//!
//! A local stand-in for the CDN edge: viewer requests are matched against the
//! configured behaviors, rewritten by their stage chains, and forwarded to the
//! matching origin.
//!
//! # Architecture Overview
//!
//! ```text
//!     Viewer Request
//!     ──────────────▶ http::server ──▶ routing::Router ──▶ functions (viewer-request chain)
//!                                                               │
//!                                          ┌────────────────────┴──────────┐
//!                                          ▼                               ▼
//!                                   synthetic response              origin fetch
//!                                          │                               │
//!                                          │               error page substitution
//!                                          │                               │
//!                                          │             functions (viewer-response chain)
//!     Viewer Response                      │                               │
//!     ◀────────────────────────────────────┴───────────────────────────────┘
//!
//!     store::MemoryStore ◀── config::watcher (import document hot reload)
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use edge_rewrite::config::{self, watcher::StoreWatcher, EdgeConfig};
use edge_rewrite::lifecycle::{signals, Shutdown};
use edge_rewrite::observability::{logging, metrics};
use edge_rewrite::HttpServer;

#[derive(Parser)]
#[command(name = "edge-rewrite")]
#[command(about = "Edge request rewrite server", long_about = None)]
struct Args {
    /// Configuration file (TOML). Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => EdgeConfig::default(),
    };

    logging::init(&config.observability.log_level);
    tracing::info!("edge-rewrite v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        behaviors = config.behaviors.len(),
        origins = config.origins.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = Arc::new(config::load_store(&config.store)?);
    tracing::info!(entries = store.len(), "Store loaded");

    // Held for the lifetime of the process; dropping it stops reloads.
    let _watcher = match (&config.store.import_path, config.store.watch) {
        (Some(path), true) => {
            let watcher = StoreWatcher::new(
                Path::new(path),
                store.clone(),
                config.store.entries.clone(),
            );
            Some(watcher.run()?)
        }
        _ => None,
    };

    let server = HttpServer::new(&config, store)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::forward_signals(shutdown));

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
