//! API gateway for the social-network services.
//!
//! Path-prefix reverse proxy in front of the users, posts, friends,
//! comments, likes and notifications services.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use http::{Dispatcher, HttpServer};
pub use lifecycle::Shutdown;
pub use routing::{build_route_table, RouteTable};
