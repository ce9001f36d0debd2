//! Configuration loading from disk and the process environment.

use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::{Environment, GatewayConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Names the optional TOML file layered under the environment.
pub const CONFIG_PATH_VAR: &str = "GATEWAY_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for {var}: {reason}")]
    Env {
        var: String,
        value: String,
        reason: String,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML configuration file. Validation is left to the caller.
fn read_config_file(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

impl GatewayConfig {
    /// Resolve configuration from the process environment.
    ///
    /// Defaults, then the file named by `GATEWAY_CONFIG` (if set), then
    /// individual environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`GatewayConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => {
                tracing::info!(path = %path, "Loading configuration file");
                read_config_file(Path::new(&path))?
            }
            None => GatewayConfig::default(),
        };

        config.apply_overrides(lookup)?;
        validate_config(&config).map_err(ConfigError::Validation)?;

        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for service in &mut self.services {
            let Some(var) = service.env_override.as_deref() else {
                continue;
            };
            match lookup(var) {
                Some(url) => service.target = url.trim().to_string(),
                None => tracing::debug!(
                    service = %service.name,
                    fallback = %service.target,
                    "{} not set, using fallback",
                    var
                ),
            }
        }

        if let Some(port) = parse_var::<u16, _>(&lookup, "PORT")? {
            self.listener.port = port;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.cors.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        let env_var = if lookup("APP_ENV").is_some() {
            "APP_ENV"
        } else {
            "NODE_ENV"
        };
        if let Some(env) = parse_var::<Environment, _>(&lookup, env_var)? {
            self.observability.environment = env;
        }
        if let Some(filter) = lookup("RUST_LOG") {
            self.observability.log_filter = Some(filter);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "UPSTREAM_TIMEOUT_SECS")? {
            self.timeouts.upstream_secs = secs;
        }
        if let Some(bytes) = parse_var::<usize, _>(&lookup, "MAX_BODY_BYTES")? {
            self.limits.max_body_bytes = bytes;
        }

        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Env {
                var: var.to_string(),
                value,
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}
