//! Demo fixture server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Pipeline under test         ┌──────────────────────────────┐
//!     ───────────────────────────▶│         demo server          │
//!                                 │  /                → 200      │
//!                                 │  /slow            → 200 late │
//!                                 │  /transientError  → 500      │
//!                                 │  /timeout         → 408      │
//!     ◀───────────────────────────│                              │
//!                                 └──────────────────────────────┘
//! ```
//!
//! Usage: `http-resilience [config.toml]`. Without an argument the
//! `RESILIENCE_CONFIG` environment variable is consulted, then defaults.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use http_resilience::config::{load_config, ResilienceConfig};
use http_resilience::http::DemoServer;
use http_resilience::lifecycle::{forward_signals, Shutdown};
use http_resilience::observability::{init_logging, init_metrics};

#[derive(Parser)]
#[command(name = "http-resilience")]
#[command(about = "Demo fixture server for resilience pipelines", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(env = "RESILIENCE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = Args::parse().config;

    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => ResilienceConfig::default(),
    };

    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?config_path,
        "http-resilience demo server starting"
    );
    tracing::info!(
        bind_address = %config.demo.bind_address,
        slow_delay_ms = config.demo.slow_delay_ms,
        error_delay_ms = config.demo.error_delay_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.demo.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    forward_signals(shutdown);

    DemoServer::new(&config.demo).run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
