//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway's own endpoints
//! - Wire up middleware (tracing, request ID, CORS)
//! - Bind server to listener
//! - Hand every other path to the dispatcher

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::loader::ConfigError;
use crate::config::schema::{CorsConfig, GatewayConfig};
use crate::http::dispatcher::Dispatcher;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::routing::RouteTable;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
}

/// HTTP server for the API gateway.
pub struct HttpServer {
    state: AppState,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server. Fails if the route table cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let table = Arc::new(RouteTable::build(&config.services)?);
        let dispatcher = Dispatcher::new(table, &config);
        Ok(Self::with_dispatcher(config, dispatcher))
    }

    /// Create a server around an already configured dispatcher.
    pub fn with_dispatcher(config: GatewayConfig, dispatcher: Dispatcher) -> Self {
        Self {
            state: AppState { dispatcher },
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        Router::new()
            // Other methods on the local paths get the dispatcher's JSON 404.
            .route("/", get(root_handler).fallback(proxy_handler))
            .route("/health", get(health_handler).fallback(proxy_handler))
            .fallback(proxy_handler)
            .with_state(self.state.clone())
            .layer(propagate_request_id_layer())
            .layer(cors_layer(&self.config.cors))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request_id(request).unwrap_or_else(|| "-".into());
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }),
            )
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener until
    /// the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "API gateway listening");

        for route in self.state.dispatcher.route_table().entries() {
            tracing::info!(
                service = %route.service_name(),
                prefix = %route.path_prefix(),
                target = %route.target(),
                "Route mounted"
            );
        }

        let app = self.router().into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Build the cross-origin policy.
///
/// An explicit origin list allows credentials; the wildcard policy cannot.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    if config.allowed_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Plain confirmation that the gateway is up.
async fn root_handler() -> &'static str {
    "API Gateway is running!"
}

async fn health_handler() -> impl IntoResponse {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();

    Json(json!({
        "status": "ok",
        "service": "api-gateway",
        "timestamp": timestamp,
    }))
}

/// Everything that is not a gateway endpoint goes through the dispatcher.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.dispatcher.dispatch(request).await
}
