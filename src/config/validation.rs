//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Detect conflicting routes (duplicate prefixes or names)
//! - Check that every target is an absolute http URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, ServiceConfig};

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no services configured")]
    NoServices,

    #[error("service at position {0} has an empty name")]
    EmptyName(usize),

    #[error("service '{0}' is declared more than once")]
    DuplicateName(String),

    #[error("prefix '{prefix}' of service '{service}' must begin with '/'")]
    PrefixNotAbsolute { service: String, prefix: String },

    #[error("prefix '{prefix}' of service '{service}' must not end with '/'")]
    PrefixTrailingSlash { service: String, prefix: String },

    #[error("prefix '{prefix}' is shared by '{first}' and '{second}'")]
    DuplicatePrefix {
        prefix: String,
        first: String,
        second: String,
    },

    #[error("target '{target}' of service '{service}' is invalid: {reason}")]
    InvalidTarget {
        service: String,
        target: String,
        reason: String,
    },

    #[error("upstream timeout must be greater than zero")]
    ZeroTimeout,

    #[error("maximum body size must be greater than zero")]
    ZeroBodyLimit,
}

/// Validate a full gateway configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = match validate_services(&config.services) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the service list alone. Used when building a route table.
pub fn validate_services(services: &[ServiceConfig]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if services.is_empty() {
        errors.push(ValidationError::NoServices);
    }

    let mut names = HashSet::new();
    let mut prefixes: Vec<(&str, &str)> = Vec::with_capacity(services.len());

    for (i, service) in services.iter().enumerate() {
        if service.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName(i));
        } else if !names.insert(service.name.as_str()) {
            errors.push(ValidationError::DuplicateName(service.name.clone()));
        }

        let prefix = service.path_prefix.as_str();
        if !prefix.starts_with('/') {
            errors.push(ValidationError::PrefixNotAbsolute {
                service: service.name.clone(),
                prefix: prefix.to_string(),
            });
        } else if prefix.ends_with('/') {
            errors.push(ValidationError::PrefixTrailingSlash {
                service: service.name.clone(),
                prefix: prefix.to_string(),
            });
        }

        if let Some((_, first)) = prefixes.iter().find(|(p, _)| *p == prefix) {
            errors.push(ValidationError::DuplicatePrefix {
                prefix: prefix.to_string(),
                first: first.to_string(),
                second: service.name.clone(),
            });
        } else {
            prefixes.push((prefix, service.name.as_str()));
        }

        if let Err(reason) = check_target(&service.target) {
            errors.push(ValidationError::InvalidTarget {
                service: service.name.clone(),
                target: service.target.clone(),
                reason,
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_target(target: &str) -> Result<Url, String> {
    let url = Url::parse(target).map_err(|e| e.to_string())?;
    // The upstream client speaks plain HTTP only.
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme '{}', expected http", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(url)
}
