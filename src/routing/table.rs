//! Route table construction and lookup.
//!
//! # Responsibilities
//! - Resolve each configured service into an immutable [`RouteEntry`]
//! - Reject conflicting or malformed routes before the gateway starts
//! - Look up the matching route for a request path
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan in declared order; first match wins
//! - Explicit `None` rather than a silent default route

use std::sync::Arc;

use axum::http::{uri::InvalidUri, HeaderValue, Uri};
use url::Url;

use crate::config::loader::ConfigError;
use crate::config::schema::ServiceConfig;
use crate::config::validation::validate_services;
use crate::routing::matcher::PathPrefixMatcher;
use crate::routing::rewrite::rewrite_path;

/// One compiled route: a prefix and the upstream it forwards to.
#[derive(Debug)]
pub struct RouteEntry {
    service_name: String,
    matcher: PathPrefixMatcher,
    target: Url,
    /// Target base path without a trailing slash ("" for a bare origin).
    base_path: String,
    /// Pre-computed `Host` value for changeOrigin.
    authority: HeaderValue,
}

impl RouteEntry {
    fn compile(service: &ServiceConfig) -> Result<Self, ConfigError> {
        let invalid = |reason: String| {
            ConfigError::Validation(vec![
                crate::config::validation::ValidationError::InvalidTarget {
                    service: service.name.clone(),
                    target: service.target.clone(),
                    reason,
                },
            ])
        };

        let target = Url::parse(&service.target).map_err(|e| invalid(e.to_string()))?;
        let host = target
            .host_str()
            .ok_or_else(|| invalid("missing host".to_string()))?;
        let authority = match target.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority = HeaderValue::from_str(&authority).map_err(|e| invalid(e.to_string()))?;
        let base_path = target.path().trim_end_matches('/').to_string();

        Ok(Self {
            service_name: service.name.clone(),
            matcher: PathPrefixMatcher::new(service.path_prefix.clone()),
            target,
            base_path,
            authority,
        })
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn path_prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Host header value presented to the upstream.
    pub fn authority(&self) -> &HeaderValue {
        &self.authority
    }

    /// Absolute upstream URI for an already rewritten path.
    pub fn upstream_uri(&self, path: &str, query: Option<&str>) -> Result<Uri, InvalidUri> {
        let mut uri = format!(
            "{}://{}{}{}",
            self.target.scheme(),
            self.authority.to_str().unwrap_or_default(),
            self.base_path,
            path
        );
        if let Some(query) = query {
            uri.push('?');
            uri.push_str(query);
        }
        uri.parse()
    }
}

/// A matched route with the forwarded path already computed.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<RouteEntry>,
    pub rewritten_path: String,
}

/// Ordered, read-only set of routes.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<Arc<RouteEntry>>,
}

impl RouteTable {
    /// Compile the configured services into a route table.
    pub fn build(services: &[ServiceConfig]) -> Result<Self, ConfigError> {
        validate_services(services).map_err(ConfigError::Validation)?;

        let entries = services
            .iter()
            .map(|s| RouteEntry::compile(s).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        for (i, later) in entries.iter().enumerate() {
            if let Some(earlier) = entries[..i]
                .iter()
                .find(|e| e.matcher.matches(later.path_prefix()))
            {
                tracing::warn!(
                    service = %later.service_name,
                    prefix = %later.path_prefix(),
                    shadowed_by = %earlier.service_name,
                    "Route is unreachable, an earlier prefix always matches first"
                );
            }
        }

        Ok(Self { entries })
    }

    /// First route (in declared order) whose prefix matches `path`.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch> {
        self.entries.iter().find_map(|entry| {
            entry.matcher.remainder(path).map(|rest| RouteMatch {
                route: entry.clone(),
                rewritten_path: rewrite_path(entry.path_prefix(), rest),
            })
        })
    }

    pub fn entries(&self) -> &[Arc<RouteEntry>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Free-function form of [`RouteTable::build`].
pub fn build_route_table(services: &[ServiceConfig]) -> Result<RouteTable, ConfigError> {
    RouteTable::build(services)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::default_services;
    use crate::config::validation::ValidationError;

    fn table() -> RouteTable {
        RouteTable::build(&default_services()).unwrap()
    }

    #[test]
    fn test_default_table_has_six_routes() {
        let table = table();
        let names: Vec<_> = table.entries().iter().map(|e| e.service_name()).collect();
        assert_eq!(
            names,
            vec!["users", "posts", "friends", "comments", "likes", "notifications"]
        );
    }

    #[test]
    fn test_match_and_rewrite() {
        let table = table();

        let m = table.match_path("/api/posts//42").unwrap();
        assert_eq!(m.route.service_name(), "posts");
        assert_eq!(m.rewritten_path, "/api/posts/42");

        let m = table.match_path("/api/comments/post/abc").unwrap();
        assert_eq!(m.route.service_name(), "comments");
        assert_eq!(m.rewritten_path, "/api/comments/post/abc");

        let m = table.match_path("/api/notifications").unwrap();
        assert_eq!(m.rewritten_path, "/api/notifications");
    }

    #[test]
    fn test_boundary_respected() {
        let table = table();
        assert!(table.match_path("/api/usersX").is_none());
        assert!(table.match_path("/api/unknown").is_none());
        assert!(table.match_path("/").is_none());
        assert_eq!(
            table.match_path("/api/users/me").unwrap().route.service_name(),
            "users"
        );
    }

    #[test]
    fn test_first_declared_match_wins() {
        let services = vec![
            ServiceConfig::new("api", "/api", "http://localhost:1000"),
            ServiceConfig::new("posts", "/api/posts", "http://localhost:4000"),
        ];
        let table = RouteTable::build(&services).unwrap();
        assert_eq!(table.match_path("/api/posts/1").unwrap().route.service_name(), "api");
    }

    #[test]
    fn test_upstream_uri() {
        let table = table();
        let m = table.match_path("/api/posts/42").unwrap();
        let uri = m.route.upstream_uri(&m.rewritten_path, Some("page=2")).unwrap();
        assert_eq!(uri.to_string(), "http://localhost:4000/api/posts/42?page=2");
        assert_eq!(m.route.authority(), "localhost:4000");
    }

    #[test]
    fn test_target_base_path_is_kept() {
        let services = vec![ServiceConfig::new("posts", "/api/posts", "http://posts.internal/v1/")];
        let table = RouteTable::build(&services).unwrap();
        let m = table.match_path("/api/posts").unwrap();
        let uri = m.route.upstream_uri(&m.rewritten_path, None).unwrap();
        assert_eq!(uri.to_string(), "http://posts.internal/v1/api/posts");
        assert_eq!(m.route.authority(), "posts.internal");
    }

    #[test]
    fn test_duplicate_prefix_is_config_error() {
        let services = vec![
            ServiceConfig::new("likes", "/api/likes", "http://localhost:2000"),
            ServiceConfig::new("likes2", "/api/likes", "http://localhost:2001"),
        ];
        match build_route_table(&services) {
            Err(ConfigError::Validation(errors)) => {
                assert!(matches!(errors[0], ValidationError::DuplicatePrefix { .. }))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_target_is_config_error() {
        let services = vec![ServiceConfig::new("users", "/api/users", "http://")];
        assert!(matches!(
            build_route_table(&services),
            Err(ConfigError::Validation(_))
        ));
    }
}
