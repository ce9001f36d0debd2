//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream calls with a deadline
//! - Classify client failures (connect vs. everything else)
//! - Cancel operations cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - The call deadline covers connect + response head
//! - After the head, the body may not stall longer than the same limit
//!   between frames ([`IdleTimeoutBody`])
//! - Dropping the wrapped future drops the upstream request with it

use std::error::Error as StdError;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use hyper::body::{Body as HttpBody, Bytes, Frame, SizeHint};
use thiserror::Error;
use tokio::time::{Instant, Sleep};

type BoxError = Box<dyn StdError + Send + Sync>;

/// Why an upstream call did not produce a usable response head.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("upstream did not respond within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("upstream body stalled for {}ms", .0.as_millis())]
    BodyIdle(Duration),

    #[error("{0}")]
    Connect(String),

    #[error("{0}")]
    Protocol(String),

    #[error("invalid upstream URI: {0}")]
    InvalidUri(String),
}

impl UpstreamError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, UpstreamError::Timeout(_))
    }
}

impl From<hyper_util::client::legacy::Error> for UpstreamError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        if err.is_connect() {
            UpstreamError::Connect(error_chain(&err))
        } else {
            UpstreamError::Protocol(error_chain(&err))
        }
    }
}

impl From<axum::http::uri::InvalidUri> for UpstreamError {
    fn from(err: axum::http::uri::InvalidUri) -> Self {
        UpstreamError::InvalidUri(err.to_string())
    }
}

/// Render an error and all of its sources as one line.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Run an upstream call under `limit`.
pub async fn with_timeout<F, T, E>(limit: Duration, call: F) -> Result<T, UpstreamError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<UpstreamError>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(UpstreamError::Timeout(limit)),
    }
}

/// Fails a response body that goes `idle` without producing a frame.
///
/// The timer restarts after every frame, so a slow but steady stream is
/// never cut off.
pub struct IdleTimeoutBody<B> {
    inner: B,
    idle: Duration,
    sleep: Pin<Box<Sleep>>,
}

impl<B> IdleTimeoutBody<B> {
    pub fn new(inner: B, idle: Duration) -> Self {
        Self {
            inner,
            idle,
            sleep: Box::pin(tokio::time::sleep(idle)),
        }
    }
}

impl<B> HttpBody for IdleTimeoutBody<B>
where
    B: HttpBody<Data = Bytes> + Unpin,
    B::Error: Into<BoxError>,
{
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(frame) => {
                let deadline = Instant::now() + this.idle;
                this.sleep.as_mut().reset(deadline);
                Poll::Ready(frame.map(|result| result.map_err(Into::into)))
            }
            Poll::Pending => match this.sleep.as_mut().poll(cx) {
                Poll::Ready(()) => {
                    Poll::Ready(Some(Err(UpstreamError::BodyIdle(this.idle).into())))
                }
                Poll::Pending => Poll::Pending,
            },
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
