//! Shared utilities for gateway integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use api_gateway::config::schema::{GatewayConfig, ServiceConfig};
use api_gateway::lifecycle::{bootstrap, Shutdown};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// What a mock upstream saw for one request.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub uri: String,
    pub host: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<String>,
    pub authorization: Option<String>,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A running mock upstream and the requests it received.
#[derive(Clone)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    pub captured: Arc<Mutex<Vec<Captured>>>,
}

impl MockUpstream {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }
}

fn header_string(request: &Request<Body>, name: header::HeaderName) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Start an upstream whose reply is computed from the captured request.
pub async fn start_programmable_upstream<F, Fut>(f: F) -> MockUpstream
where
    F: Fn(Captured) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured = Arc::new(Mutex::new(Vec::new()));

    let f = Arc::new(f);
    let log = captured.clone();
    let app = Router::new().fallback(move |request: Request<Body>| {
        let f = f.clone();
        let log = log.clone();
        async move {
            let method = request.method().to_string();
            let uri = request.uri().to_string();
            let host = header_string(&request, header::HOST);
            let content_type = header_string(&request, header::CONTENT_TYPE);
            let content_length = header_string(&request, header::CONTENT_LENGTH);
            let authorization = header_string(&request, header::AUTHORIZATION);
            let body = to_bytes(request.into_body(), usize::MAX)
                .await
                .unwrap()
                .to_vec();

            let seen = Captured {
                method,
                uri,
                host,
                content_type,
                content_length,
                authorization,
                body,
            };
            log.lock().unwrap().push(seen.clone());
            f(seen).await
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, captured }
}

/// Start an upstream that answers every request with `status` and a JSON
/// echo of the forwarded URI and Host header.
pub async fn start_echo_upstream(name: &'static str, status: StatusCode) -> MockUpstream {
    start_programmable_upstream(move |seen| async move {
        let body = serde_json::json!({
            "service": name,
            "uri": seen.uri,
            "host": seen.host,
        });
        (
            status,
            [("x-upstream", name)],
            axum::Json(body),
        )
            .into_response()
    })
    .await
}

/// An address nothing listens on.
pub fn unused_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// Accepts connections and reads requests but never answers.
pub async fn start_hanging_upstream() -> SocketAddr {
    start_raw_upstream(|mut socket| async move {
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        tokio::time::sleep(Duration::from_secs(3600)).await;
        drop(socket);
    })
    .await
}

/// Writes `reply` verbatim after reading the request, then closes.
pub async fn start_raw_reply_upstream(reply: &'static [u8]) -> SocketAddr {
    start_raw_upstream(move |mut socket| async move {
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let _ = socket.write_all(reply).await;
        let _ = socket.shutdown().await;
    })
    .await
}

async fn start_raw_upstream<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(tokio::net::TcpStream) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    tokio::spawn(handler(socket));
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a gateway on an ephemeral port in front of `services`.
pub async fn start_gateway(services: Vec<ServiceConfig>, upstream_secs: u64) -> (SocketAddr, Shutdown) {
    let mut config = GatewayConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.services = services;
    config.timeouts.upstream_secs = upstream_secs;

    let (server, listener) = bootstrap(config).await.expect("gateway failed to start");
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// A client that never reuses connections or honours system proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
