//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (enforce the per-call deadline, classify failures)
//!     → On failure: failure.rs (FailureRecord → 502 JSON naming the service)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - A failure is surfaced immediately, never retried
//! - One failed upstream never affects requests to other routes

pub mod failure;
pub mod timeouts;

pub use failure::FailureRecord;
pub use timeouts::{error_chain, with_timeout, UpstreamError};
