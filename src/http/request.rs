//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Read the inbound body exactly once, within the size limit
//! - Prepare the forwarded request (URI, Host, framing headers)
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The buffered body feeds forwarding directly; nothing re-reads the stream
//! - Original request preserved for logging; modified copy forwarded

use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::extract::ConnectInfo;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Version};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use uuid::Uuid;

use crate::http::response::GatewayError;
use crate::observability::observer::ProxyContext;
use crate::resilience::timeouts::UpstreamError;
use crate::routing::RouteMatch;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Generates a v4 UUID for requests that arrive without an id.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Assigns `x-request-id` unless the caller already sent one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuidV4> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4)
}

/// Copies `x-request-id` from the request onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// The request id header, if present and printable.
pub fn request_id<B>(request: &Request<B>) -> Option<String> {
    request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// One inbound call, buffered and matched, ready to be forwarded.
#[derive(Debug)]
pub struct ProxiedRequest {
    pub method: Method,
    pub original_path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub matched: RouteMatch,
    pub client_addr: Option<SocketAddr>,
}

impl ProxiedRequest {
    /// Consume the inbound request, reading its body once.
    pub async fn read(
        request: Request<Body>,
        matched: RouteMatch,
        max_body_bytes: usize,
    ) -> Result<Self, GatewayError> {
        let client_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let (parts, body) = request.into_parts();

        let body = match Limited::new(body, max_body_bytes).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                return Err(GatewayError::PayloadTooLarge {
                    limit: max_body_bytes,
                })
            }
            Err(err) => return Err(GatewayError::BodyRead(err.to_string())),
        };

        Ok(Self {
            method: parts.method,
            original_path: parts.uri.path().to_string(),
            query: parts.uri.query().map(String::from),
            headers: parts.headers,
            body,
            matched,
            client_addr,
        })
    }

    /// Snapshot handed to observers.
    pub fn context(&self) -> ProxyContext {
        ProxyContext {
            service: self.matched.route.service_name().to_string(),
            method: self.method.clone(),
            original_path: self.original_path.clone(),
            request_id: self
                .headers
                .get(&X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .map(String::from),
        }
    }

    /// Build the outbound request for the matched upstream.
    pub fn into_upstream(self) -> Result<Request<Body>, UpstreamError> {
        let route = &self.matched.route;
        let uri = route.upstream_uri(&self.matched.rewritten_path, self.query.as_deref())?;

        let mut headers = self.headers;
        strip_hop_by_hop(&mut headers);
        headers.insert(HOST, route.authority().clone());
        headers.remove(CONTENT_LENGTH);

        if !self.body.is_empty() {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(self.body.len()));
            if !headers.contains_key(CONTENT_TYPE) && is_json(&self.body) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
        }

        if let Some(addr) = self.client_addr {
            append_forwarded_for(&mut headers, addr);
        }

        let mut request = Request::new(Body::from(self.body));
        *request.method_mut() = self.method;
        *request.uri_mut() = uri;
        *request.version_mut() = Version::HTTP_11;
        *request.headers_mut() = headers;
        Ok(request)
    }
}

fn is_json(body: &[u8]) -> bool {
    serde_json::from_slice::<serde::de::IgnoredAny>(body).is_ok()
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all("connection")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, addr: SocketAddr) {
    let ip = addr.ip().to_string();
    let value = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(existing) => format!("{}, {}", existing, ip),
        None => ip,
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
