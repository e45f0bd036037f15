//! Header reflector server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request           ┌──────────────────────────────────────────────┐
//!     ─────────────────────────┼─▶ axum server ──▶ middleware ──▶ reflector  │
//!                              │   (http / tls)    trace, panic,   headers,   │
//!     Client Response          │                   limits          device,    │
//!     ◀────────────────────────┼── JSON payload ◀──────────────── response   │
//!                              │                                              │
//!                              │   config (toml, watched) ─▶ ArcSwap settings │
//!                              │   observability: tracing + prometheus        │
//!                              └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use header_reflector::config::{load_config, watcher::ConfigWatcher, ServiceConfig};
use header_reflector::lifecycle::signals::shutdown_signal;
use header_reflector::net::load_tls_config;
use header_reflector::observability::{logging, metrics};
use header_reflector::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "header-reflector")]
#[command(about = "Echoes request headers and client metadata as JSON", long_about = None)]
struct Args {
    /// TOML configuration file; watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!("header-reflector v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        tls = config.listener.tls.is_some(),
        "Configuration loaded"
    );

    // Keep the watcher alive for the lifetime of the server.
    let (config_updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, config.clone());
            (updates, Some(watcher.run()?))
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (updates, None)
        }
    };

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config.clone());
    match &config.listener.tls {
        Some(tls) => {
            let tls_config = load_tls_config(tls).await?;
            let listener = std::net::TcpListener::bind(&config.listener.bind_address)?;
            listener.set_nonblocking(true)?;
            server
                .run_tls(listener, tls_config, config_updates, server_shutdown)
                .await?;
        }
        None => {
            let listener = TcpListener::bind(&config.listener.bind_address).await?;
            server.run(listener, config_updates, server_shutdown).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
