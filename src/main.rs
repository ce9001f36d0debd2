//! API Gateway
//!
//! Single entry point for the social-network backend.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌───────────────────────────────────────────────┐
//!                          │                  API GATEWAY                  │
//!                          │                                               │
//!     Client Request       │  ┌─────────┐    ┌──────────┐    ┌──────────┐  │
//!     ─────────────────────┼─▶│  http   │───▶│ routing  │───▶│dispatcher│──┼──▶ users    :9000
//!                          │  │ server  │    │  table   │    │ + rewrite│──┼──▶ posts    :4000
//!                          │  └─────────┘    └──────────┘    └────┬─────┘──┼──▶ friends  :6000
//!                          │       ▲                              │      ──┼──▶ comments :5000
//!     Client Response      │       │         ┌──────────────┐     │      ──┼──▶ likes    :2000
//!     ◀────────────────────┼───────┴─────────│  relay / 502 │◀────┘      ──┼──▶ notifs   :7000
//!                          │                 └──────────────┘              │
//!                          │  config · observability · resilience · lifecycle
//!                          └───────────────────────────────────────────────┘
//! ```

use api_gateway::config::schema::{GatewayConfig, ObservabilityConfig};
use api_gateway::lifecycle::{bootstrap, signals, Shutdown};
use api_gateway::observability::logging::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Invalid configuration, refusing to start");
            return Err(e.into());
        }
    };

    init_logging(&config.observability);

    tracing::info!("api-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        port = config.listener.port,
        services = config.services.len(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        cors_origins = ?config.cors.allowed_origins,
        environment = ?config.observability.environment,
        "Configuration loaded"
    );

    let (server, listener) = bootstrap(config).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
