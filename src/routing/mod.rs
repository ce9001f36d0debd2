//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → table.rs (scan routes in declared order)
//!     → matcher.rs (prefix + segment boundary)
//!     → rewrite.rs (prefix + remainder, collapse "//")
//!     → Return: RouteMatch or None
//!
//! Route Compilation (at startup):
//!     ServiceConfig[]
//!     → Validate (unique prefixes, absolute http targets)
//!     → Resolve target URL and Host authority
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (declared order)

pub mod matcher;
pub mod rewrite;
pub mod table;

pub use matcher::PathPrefixMatcher;
pub use rewrite::{collapse_slashes, rewrite_path};
pub use table::{build_route_table, RouteEntry, RouteMatch, RouteTable};
