//! Proxy lifecycle hooks.
//!
//! The dispatcher reports three instants for every forwarded request:
//! the request leaving for the upstream, the upstream response head arriving,
//! and a failure talking to the upstream. Sinks implement [`ProxyObserver`];
//! [`ObserverChain`] fans one event out to several sinks.
//!
//! Hooks are fire-and-forget. They return nothing and the dispatcher never
//! waits on them beyond the call itself.

use std::fmt;
use std::sync::Arc;

use axum::http::{Method, StatusCode};

/// Identity of one proxied request, as seen by observers.
#[derive(Debug, Clone)]
pub struct ProxyContext {
    pub service: String,
    pub method: Method,
    pub original_path: String,
    pub request_id: Option<String>,
}

impl ProxyContext {
    /// `[ProxyReq:{service}] {method} {path}`
    pub fn request_line(&self) -> String {
        format!(
            "[ProxyReq:{}] {} {}",
            self.service, self.method, self.original_path
        )
    }

    /// `[ProxyRes:{service}] {method} {path} <- {status}`
    pub fn response_line(&self, status: StatusCode) -> String {
        format!(
            "[ProxyRes:{}] {} {} <- {}",
            self.service,
            self.method,
            self.original_path,
            status.as_u16()
        )
    }

    /// `[ProxyErr:{service}] {method} {path}: {message}`
    pub fn error_line(&self, message: &str) -> String {
        format!(
            "[ProxyErr:{}] {} {}: {}",
            self.service, self.method, self.original_path, message
        )
    }
}

/// Receives proxy lifecycle events.
pub trait ProxyObserver: Send + Sync + fmt::Debug {
    /// The request is about to be sent upstream.
    fn on_proxy_req(&self, ctx: &ProxyContext);

    /// The upstream answered with a response head.
    fn on_proxy_res(&self, ctx: &ProxyContext, status: StatusCode);

    /// Talking to the upstream failed, before or after the response head.
    fn on_proxy_error(&self, ctx: &ProxyContext, message: &str);
}

/// Emits one structured log line per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ProxyObserver for LogObserver {
    fn on_proxy_req(&self, ctx: &ProxyContext) {
        tracing::info!(
            service = %ctx.service,
            method = %ctx.method,
            path = %ctx.original_path,
            request_id = ctx.request_id.as_deref().unwrap_or("-"),
            "{}",
            ctx.request_line()
        );
    }

    fn on_proxy_res(&self, ctx: &ProxyContext, status: StatusCode) {
        tracing::info!(
            service = %ctx.service,
            method = %ctx.method,
            path = %ctx.original_path,
            status = status.as_u16(),
            request_id = ctx.request_id.as_deref().unwrap_or("-"),
            "{}",
            ctx.response_line(status)
        );
    }

    fn on_proxy_error(&self, ctx: &ProxyContext, message: &str) {
        tracing::error!(
            service = %ctx.service,
            method = %ctx.method,
            path = %ctx.original_path,
            request_id = ctx.request_id.as_deref().unwrap_or("-"),
            "{}",
            ctx.error_line(message)
        );
    }
}

/// Forwards every event to each contained observer, in order.
#[derive(Debug, Clone, Default)]
pub struct ObserverChain {
    observers: Vec<Arc<dyn ProxyObserver>>,
}

impl ObserverChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn ProxyObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl ProxyObserver for ObserverChain {
    fn on_proxy_req(&self, ctx: &ProxyContext) {
        for observer in &self.observers {
            observer.on_proxy_req(ctx);
        }
    }

    fn on_proxy_res(&self, ctx: &ProxyContext, status: StatusCode) {
        for observer in &self.observers {
            observer.on_proxy_res(ctx, status);
        }
    }

    fn on_proxy_error(&self, ctx: &ProxyContext, message: &str) {
        for observer in &self.observers {
            observer.on_proxy_error(ctx, message);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingObserver;
    use super::*;

    fn ctx() -> ProxyContext {
        ProxyContext {
            service: "posts".into(),
            method: Method::POST,
            original_path: "/api/posts".into(),
            request_id: None,
        }
    }

    #[test]
    fn test_log_lines() {
        let ctx = ctx();
        assert_eq!(ctx.request_line(), "[ProxyReq:posts] POST /api/posts");
        assert_eq!(
            ctx.response_line(StatusCode::CREATED),
            "[ProxyRes:posts] POST /api/posts <- 201"
        );
        assert_eq!(
            ctx.error_line("connect error: Connection refused"),
            "[ProxyErr:posts] POST /api/posts: connect error: Connection refused"
        );

        let ctx = ProxyContext {
            service: "comments".into(),
            method: Method::GET,
            original_path: "/api/comments//post/p1".into(),
            request_id: Some("abc".into()),
        };
        // The caller's path is logged as received, before rewriting.
        assert_eq!(
            ctx.response_line(StatusCode::NOT_FOUND),
            "[ProxyRes:comments] GET /api/comments//post/p1 <- 404"
        );
    }

    #[test]
    fn test_chain_fans_out_in_order() {
        let a = Arc::new(RecordingObserver::default());
        let b = Arc::new(RecordingObserver::default());
        let chain = ObserverChain::new()
            .with(a.clone())
            .with(Arc::new(LogObserver))
            .with(b.clone());
        assert_eq!(chain.len(), 3);

        chain.on_proxy_req(&ctx());
        chain.on_proxy_res(&ctx(), StatusCode::CREATED);
        chain.on_proxy_error(&ctx(), "connection refused");

        let expected = vec![
            "[ProxyReq:posts] POST /api/posts".to_string(),
            "[ProxyRes:posts] POST /api/posts <- 201".to_string(),
            "[ProxyErr:posts] POST /api/posts: connection refused".to_string(),
        ];
        assert_eq!(a.events(), expected);
        assert_eq!(b.events(), expected);
    }
}
