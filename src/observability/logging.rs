//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Pick verbosity and format from the runtime environment
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` always wins over the environment default

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::{Environment, ObservabilityConfig};

/// Default filter directive for an environment.
pub fn default_directive(environment: Environment) -> &'static str {
    match environment {
        Environment::Production => "api_gateway=info,tower_http=info",
        Environment::Development => "api_gateway=debug,tower_http=debug",
        // Proxy access logs are noise under test.
        Environment::Test => "api_gateway=warn,tower_http=warn",
    }
}

/// Build the filter for the given configuration.
pub fn build_filter(config: &ObservabilityConfig) -> EnvFilter {
    let directive = config
        .log_filter
        .as_deref()
        .unwrap_or_else(|| default_directive(config.environment));

    EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!("invalid log filter '{}': {}, using defaults", directive, e);
        EnvFilter::new(default_directive(config.environment))
    })
}

/// Install the global subscriber. Safe to call more than once.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = build_filter(config);

    let result = match config.environment {
        Environment::Production => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_filter_wins() {
        let config = ObservabilityConfig {
            environment: Environment::Test,
            log_filter: Some("api_gateway=trace".to_string()),
        };
        assert_eq!(build_filter(&config).to_string(), "api_gateway=trace");
    }

    #[test]
    fn test_invalid_filter_falls_back() {
        let config = ObservabilityConfig {
            environment: Environment::Production,
            log_filter: Some("api_gateway=loudest".to_string()),
        };
        assert_eq!(
            build_filter(&config).to_string(),
            EnvFilter::new(default_directive(Environment::Production)).to_string()
        );
    }
}
