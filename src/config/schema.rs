//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the API gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream services, in match order.
    pub services: Vec<ServiceConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request size limits.
    pub limits: LimitsConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            services: default_services(),
            timeouts: TimeoutConfig::default(),
            cors: CorsConfig::default(),
            observability: ObservabilityConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind on.
    pub host: String,

    /// Port to bind on.
    pub port: u16,
}

impl ListenerConfig {
    /// The `host:port` string handed to the TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// One upstream service the gateway forwards to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Logical service name used in logs and error bodies.
    pub name: String,

    /// Path prefix the service is mounted under (e.g. "/api/posts").
    pub path_prefix: String,

    /// Base URL of the upstream (e.g. "http://localhost:4000").
    pub target: String,

    /// Environment variable that overrides `target`, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_override: Option<String>,
}

impl ServiceConfig {
    pub fn new(
        name: impl Into<String>,
        path_prefix: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path_prefix: path_prefix.into(),
            target: target.into(),
            env_override: None,
        }
    }

    /// Attach the environment variable that may override the target URL.
    pub fn with_env_override(mut self, var: impl Into<String>) -> Self {
        self.env_override = Some(var.into());
        self
    }
}

/// The six social-network services with their fallback base URLs.
pub fn default_services() -> Vec<ServiceConfig> {
    vec![
        ServiceConfig::new("users", "/api/users", "http://localhost:9000")
            .with_env_override("USER_SERVICE_URL"),
        ServiceConfig::new("posts", "/api/posts", "http://localhost:4000")
            .with_env_override("POST_SERVICE_URL"),
        ServiceConfig::new("friends", "/api/friends", "http://localhost:6000")
            .with_env_override("FRIENDSHIP_SERVICE_URL"),
        ServiceConfig::new("comments", "/api/comments", "http://localhost:5000")
            .with_env_override("COMMENT_SERVICE_URL"),
        ServiceConfig::new("likes", "/api/likes", "http://localhost:2000")
            .with_env_override("LIKE_SERVICE_URL"),
        ServiceConfig::new("notifications", "/api/notifications", "http://localhost:7000")
            .with_env_override("NOTIFICATION_SERVICE_URL"),
    ]
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upper bound for one upstream call (connect + response head), in seconds.
    pub upstream_secs: u64,

    /// Idle pooled connection timeout in seconds.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 10,
            idle_secs: 60,
        }
    }
}

/// Cross-origin resource sharing policy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. Empty means any origin.
    pub allowed_origins: Vec<String>,
}

/// Runtime environment, drives default log verbosity.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    #[default]
    Development,
    Test,
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Selects log verbosity and format.
    pub environment: Environment,

    /// Explicit filter directive, overrides the environment default.
    pub log_filter: Option<String>,
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum buffered request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}
