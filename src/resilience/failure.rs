//! Upstream failure translation.
//!
//! # States
//! ```text
//! Forwarding → Success        upstream produced a response head, relayed as-is
//! Forwarding → UpstreamError  refused / DNS / timeout / unusable response
//! ```
//!
//! An `UpstreamError` before any byte reached the caller becomes exactly one
//! 502 JSON body naming the service. Failures after the response head was
//! relayed are only logged (see `http::response::relay`). There is no retry.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::response::ErrorBody;
use crate::resilience::timeouts::UpstreamError;

/// Shape of the error response for one failed upstream call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub service: String,
    pub details: String,
    pub status: StatusCode,
}

impl FailureRecord {
    /// Upstream could not be reached or gave nothing usable.
    pub fn unreachable(service: impl Into<String>, error: &UpstreamError) -> Self {
        Self {
            service: service.into(),
            details: error.to_string(),
            status: StatusCode::BAD_GATEWAY,
        }
    }

    pub fn message(&self) -> String {
        format!("Unable to reach {} service", self.service)
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody::new(self.message(), self.details.clone())
    }
}

impl IntoResponse for FailureRecord {
    fn into_response(self) -> Response {
        (self.status, self.body()).into_response()
    }
}
