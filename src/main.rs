//! Edge gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ axum router (request ID, trace, body limit, timeout)
//!                 │
//!                 ├── /metrics ──▶ Prometheus render
//!                 │
//!                 └── pipeline: logging → load count → [rate limit] → [auth] → cache lookup
//!                         │
//!                         ├── /version, /health ──▶ static handlers
//!                         └── everything else ──▶ dispatcher
//!                                                   │ route table: prefix → pool
//!                                                   │ round-robin pick
//!                                                   ▼
//!                                                 backend ──▶ response relayed + cached
//!
//!   Load Monitor: samples the request counter every interval, alerts above threshold.
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_gateway::config::{load_config, GatewayConfig};
use edge_gateway::lifecycle::{services_from_config, signals, Shutdown, StartupError};
use edge_gateway::observability::{logging, metrics};
use edge_gateway::GatewayServer;

#[derive(Parser, Debug)]
#[command(name = "edge-gateway", version, about = "HTTP edge gateway with pooled backends and response caching")]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen port from the configuration.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path).map_err(StartupError::from)?,
        None => GatewayConfig::default(),
    };
    if let Some(port) = cli.port {
        config.listener.bind_address = with_port(&config.listener.bind_address, port);
    }

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "edge-gateway starting");

    let prometheus = if config.observability.metrics_enabled {
        Some(metrics::setup_metrics()?)
    } else {
        None
    };

    let services = services_from_config(&config, prometheus)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        pools = config.pools.iter().count(),
        routes = config.routes.len(),
        auth = config.auth.enabled,
        rate_limit = config.rate_limit.enabled,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let server = GatewayServer::new(config, services).map_err(StartupError::from)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        trigger.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Replace the port of a `host:port` bind address.
fn with_port(bind_address: &str, port: u16) -> String {
    let host = bind_address
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(bind_address);
    format!("{host}:{port}")
}
