//! # Achievements Gateway
//!
//! HTTP gateway between client applications and the Qtum achievements
//! contracts. See `qa_runtime` for the startup sequence.

use anyhow::{Context, Result};
use clap::Parser;
use qa_gateway::GatewayServer;
use qa_runtime::{collaborators, Args};
use qa_telemetry::{init_logging, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let telemetry = TelemetryConfig::from_env();
    init_logging(&telemetry).context("failed to initialise logging")?;

    let config = args.load_config()?;

    info!("===========================================");
    info!("  Achievements Gateway v{}", qa_gateway::VERSION);
    info!("  Node: {} ({})", config.node.url, config.node.network);
    info!("  Registry: {}", config.contracts.registry);
    info!("===========================================");

    let collaborators = collaborators(&config)?;
    let server = GatewayServer::new(config, collaborators).context("failed to assemble gateway")?;
    let mut running = server.start().await.context("failed to start HTTP server")?;

    info!("Gateway is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    info!("Shutting down");
    running.shutdown();
    running.wait().await.context("HTTP server exited with an error")?;

    Ok(())
}
