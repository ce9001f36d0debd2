//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration and compile the route table
//! - Bind the listener and hand back a ready server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use tokio::net::TcpListener;
use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::config::schema::GatewayConfig;
use crate::http::HttpServer;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Build the server and bind its listener.
pub async fn bootstrap(config: GatewayConfig) -> Result<(HttpServer, TcpListener), StartupError> {
    let server = HttpServer::new(config)?;

    let address = server.config().listener.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    Ok((server, listener))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ServiceConfig;

    #[tokio::test]
    async fn test_conflicting_routes_refuse_to_start() {
        let mut config = GatewayConfig::default();
        config.services.push(ServiceConfig::new("dup", "/api/posts", "http://localhost:4100"));

        let err = bootstrap(config).await.err().unwrap();
        assert!(matches!(err, StartupError::Config(ConfigError::Validation(_))));
    }

    #[tokio::test]
    async fn test_binds_ephemeral_port() {
        let mut config = GatewayConfig::default();
        config.listener.host = "127.0.0.1".into();
        config.listener.port = 0;

        let (_, listener) = bootstrap(config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }
}
