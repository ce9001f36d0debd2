//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults (six services, fallback URLs)
//!     → optional TOML file (GATEWAY_CONFIG)
//!     → environment overrides (loader.rs)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → handed to the gateway constructor
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigError, CONFIG_PATH_VAR};
pub use schema::{
    CorsConfig, Environment, GatewayConfig, LimitsConfig, ListenerConfig, ObservabilityConfig,
    ServiceConfig, TimeoutConfig,
};
pub use validation::ValidationError;
