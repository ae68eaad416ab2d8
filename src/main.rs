//! drain-guard - an HTTP server that drains its connections before exiting
//!
//! This is the main entry point for the drain-guard application.

use tokio::net::TcpListener;
use tracing::{error, info};

use drain_guard::{api::create_router, config::Config, server, utils::SignalBridge};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("drain_guard={},tower_http=info", config.log_level()))
        .init();

    info!("Starting drain-guard server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, force_timeout={}ms, run_mode={}",
        config.host, config.port, config.force_timeout_ms, config.run_mode
    );

    // Bind to the specified address
    let listener = TcpListener::bind(config.address()).await?;
    let mut server = server::start(listener, create_router(), config.drain_config())?;

    info!("Server running on http://{}", server.local_addr);
    info!("Endpoints:");
    info!("  GET /          - Greeting");
    info!("  GET /work?ms=N - Hold the request open for N milliseconds");

    // The bridge owns process exit from here on
    let bridge = SignalBridge::new(server.drain.clone()).development(config.is_development());

    tokio::select! {
        result = bridge.run() => {
            if let Err(e) = result {
                error!("Failed to install signal handlers: {}", e);
                return Err(e.into());
            }
        }
        result = &mut server.task => {
            if let Err(e) = result {
                error!("Server task failed: {}", e);
            }
        }
    }

    if let Ok(status) = server.drain.status().await {
        info!("Final drain status: {}", serde_json::to_string(&status)?);
    }
    info!("Server shutdown complete");
    Ok(())
}
