//! Request dispatch to upstream services.
//!
//! # Responsibilities
//! - Select the route for an inbound request
//! - Buffer, rewrite and forward the request
//! - Fire observer hooks around the upstream call
//! - Translate upstream failures into a single 502
//!
//! # Design Decisions
//! - Holds only immutable shared state; cloning is cheap
//! - One upstream call per request, no retries
//! - Caller disconnect drops this future and the upstream call with it

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::config::schema::GatewayConfig;
use crate::http::request::ProxiedRequest;
use crate::http::response::{relay, GatewayError};
use crate::observability::observer::{LogObserver, ProxyObserver};
use crate::resilience::failure::FailureRecord;
use crate::resilience::timeouts::with_timeout;
use crate::routing::RouteTable;

/// HTTP client type for forwarding requests.
pub type HttpClient = Client<HttpConnector, Body>;

/// Forwards requests to the upstream selected by the route table.
#[derive(Clone)]
pub struct Dispatcher {
    table: Arc<RouteTable>,
    client: HttpClient,
    observer: Arc<dyn ProxyObserver>,
    upstream_timeout: Duration,
    max_body_bytes: usize,
}

impl Dispatcher {
    /// Create a dispatcher that logs through [`LogObserver`].
    pub fn new(table: Arc<RouteTable>, config: &GatewayConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.upstream_secs)));

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(config.timeouts.idle_secs))
            .build(connector);

        Self {
            table,
            client,
            observer: Arc::new(LogObserver),
            upstream_timeout: Duration::from_secs(config.timeouts.upstream_secs),
            max_body_bytes: config.limits.max_body_bytes,
        }
    }

    /// Replace the observer sink.
    pub fn with_observer(mut self, observer: Arc<dyn ProxyObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn route_table(&self) -> &RouteTable {
        &self.table
    }

    /// Forward one request and return whatever the caller should see.
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        match self.forward(request).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }

    async fn forward(&self, request: Request<Body>) -> Result<Response, GatewayError> {
        let Some(matched) = self.table.match_path(request.uri().path()) else {
            tracing::debug!(
                method = %request.method(),
                path = %request.uri().path(),
                "No route matched"
            );
            return Err(GatewayError::NoRouteMatch {
                method: request.method().clone(),
                path: request.uri().path().to_string(),
            });
        };

        let proxied = ProxiedRequest::read(request, matched, self.max_body_bytes).await?;
        let ctx = proxied.context();

        self.observer.on_proxy_req(&ctx);

        let result = match proxied.into_upstream() {
            Ok(upstream) => with_timeout(self.upstream_timeout, self.client.request(upstream)).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(response) => {
                self.observer.on_proxy_res(&ctx, response.status());
                Ok(relay(
                    response,
                    self.observer.clone(),
                    ctx,
                    self.upstream_timeout,
                ))
            }
            Err(err) => {
                let record = FailureRecord::unreachable(ctx.service.as_str(), &err);
                self.observer.on_proxy_error(&ctx, &record.details);
                Err(GatewayError::Upstream(record))
            }
        }
    }
}
