//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay the upstream response to the caller untouched
//! - Report body failures that surface after the head was relayed
//! - Render gateway-local errors as JSON
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Once the head is relayed a failure can only be logged, never answered

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::observer::{ProxyContext, ProxyObserver};
use crate::resilience::failure::FailureRecord;
use crate::resilience::timeouts::{error_chain, IdleTimeoutBody};

/// JSON error body returned by the gateway itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

impl IntoResponse for ErrorBody {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Errors answered by the gateway without a relayed upstream response.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no route matches {method} {path}")]
    NoRouteMatch { method: Method, path: String },

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    BodyRead(String),

    #[error("{}", .0.message())]
    Upstream(FailureRecord),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NoRouteMatch { .. } => StatusCode::NOT_FOUND,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::BodyRead(_) => StatusCode::BAD_REQUEST,
            GatewayError::Upstream(record) => record.status,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = self.to_string();
        let error = match self {
            GatewayError::Upstream(record) => return record.into_response(),
            GatewayError::NoRouteMatch { .. } => "Not Found",
            GatewayError::PayloadTooLarge { .. } => "Payload Too Large",
            GatewayError::BodyRead(_) => "Bad Request",
        };
        (status, ErrorBody::new(error, details)).into_response()
    }
}

/// Hand the upstream response back to the caller.
///
/// Status, headers and body pass through unchanged. A body error after this
/// point, including a body that produces nothing for `idle`, is reported to
/// the observer and then propagated, which aborts the caller's connection
/// instead of sending a second response.
pub fn relay(
    response: Response<Incoming>,
    observer: Arc<dyn ProxyObserver>,
    ctx: ProxyContext,
    idle: Duration,
) -> Response {
    let (parts, body) = response.into_parts();
    let body = IdleTimeoutBody::new(body, idle).map_err(move |err| {
        observer.on_proxy_error(&ctx, &error_chain(&*err));
        err
    });
    Response::from_parts(parts, Body::new(body))
}
