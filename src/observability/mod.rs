//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher events (request sent, response received, upstream failure)
//!     → observer.rs (ProxyObserver sinks, composable via ObserverChain)
//!     → logging.rs (tracing subscriber, stdout)
//!
//! Every inbound request additionally gets a tower-http trace span.
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing in production
//! - Request ID flows through all log lines
//! - Hooks are best-effort and never fail a request

pub mod logging;
pub mod observer;

pub use observer::{LogObserver, ObserverChain, ProxyContext, ProxyObserver};
