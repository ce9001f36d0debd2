//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, CORS, trace span)
//!     → "/" and "/health" answered locally
//!     → dispatcher.rs (route lookup, forward, failure translation)
//!     → request.rs (read body once, rewrite URI and Host)
//!     → response.rs (relay upstream response, JSON errors)
//!     → Send to client
//! ```

pub mod dispatcher;
pub mod request;
pub mod response;
pub mod server;

pub use dispatcher::{Dispatcher, HttpClient};
pub use request::{ProxiedRequest, X_REQUEST_ID};
pub use response::{ErrorBody, GatewayError};
pub use server::HttpServer;
