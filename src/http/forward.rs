//! Outbound forwarding to the resolved origin.
//!
//! # Responsibilities
//! - Hold the shared HTTPS-capable client
//! - Send the rewritten request and stream the response back unbuffered
//! - Enforce the three outbound timeouts: connect, response-header,
//!   idle-body-read
//!
//! # Design Decisions
//! - The outbound URI arrives pre-built from the validated target; this
//!   module never touches the raw target spec
//! - Dropping the returned response body (client went away) cancels the
//!   outbound request and releases its connection
//! - Connect-class failures map to `UpstreamUnreachable`, everything else
//!   the client reports to `UpstreamProtocolError`; both answer 502

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::OnceLock;
use std::task::{ready, Context, Poll};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use bytes::Bytes;
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tokio::time::Sleep;

use crate::config::TimeoutConfig;
use crate::error::ProxyError;
use crate::routing::OutboundParts;

/// Streaming forwarder shared by all requests.
pub struct Forwarder {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    response_header_timeout: Duration,
    idle_read_timeout: Duration,
}

impl Forwarder {
    /// Build the shared client. Fails only when the TLS foundation cannot be
    /// set up (crypto provider, native root store).
    pub fn new(timeouts: &TimeoutConfig) -> io::Result<Self> {
        static RUSTLS_INIT: OnceLock<Result<(), ()>> = OnceLock::new();
        let installed = RUSTLS_INIT.get_or_init(|| {
            rustls::crypto::ring::default_provider()
                .install_default()
                .map_err(|_| ())
        });
        if installed.is_err() {
            return Err(io::Error::other("failed to install rustls crypto provider"));
        }

        let mut connector = HttpConnector::new();
        connector.enforce_http(false);
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let https = HttpsConnectorBuilder::new()
            .with_native_roots()?
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .wrap_connector(connector);

        let client = Client::builder(TokioExecutor::new()).build(https);

        Ok(Self {
            client,
            response_header_timeout: Duration::from_secs(timeouts.response_header_secs),
            idle_read_timeout: Duration::from_secs(timeouts.idle_read_secs),
        })
    }

    /// Send the rewritten request and hand back the streaming response.
    pub async fn forward(
        &self,
        method: Method,
        outbound: OutboundParts,
        body: Body,
    ) -> Result<Response<Body>, ProxyError> {
        let mut request = Request::builder()
            .method(method)
            .uri(outbound.uri)
            .body(body)
            .map_err(|e| ProxyError::Internal(format!("outbound request: {e}")))?;
        *request.headers_mut() = outbound.headers;

        let response = tokio::time::timeout(self.response_header_timeout, self.client.request(request))
            .await
            .map_err(|_| {
                ProxyError::UpstreamUnreachable("timed out waiting for response headers".to_string())
            })?
            .map_err(map_client_error)?;

        let (parts, upstream_body) = response.into_parts();
        Ok(Response::from_parts(
            parts,
            guard_upstream_body(upstream_body, self.idle_read_timeout),
        ))
    }
}

/// Wrap the upstream body so a stalled stream errors out instead of pinning
/// a connection forever.
fn guard_upstream_body(body: Incoming, idle_read_timeout: Duration) -> Body {
    Body::new(TimeoutBody::new(body, idle_read_timeout))
}

fn map_client_error(e: hyper_util::client::legacy::Error) -> ProxyError {
    if e.is_connect() {
        ProxyError::UpstreamUnreachable(e.to_string())
    } else {
        ProxyError::UpstreamProtocolError(e.to_string())
    }
}

/// A body adapter that bounds the gap between frames.
///
/// The deadline re-arms after every frame, so a slow-but-moving media stream
/// is fine while a silent upstream is cut off.
struct TimeoutBody<B> {
    inner: B,
    timeout: Duration,
    deadline: Option<Pin<Box<Sleep>>>,
}

impl<B> TimeoutBody<B> {
    fn new(inner: B, timeout: Duration) -> Self {
        Self {
            inner,
            timeout,
            deadline: None,
        }
    }
}

impl<B> http_body::Body for TimeoutBody<B>
where
    B: http_body::Body<Data = Bytes> + Unpin,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Data = Bytes;
    type Error = Box<dyn std::error::Error + Send + Sync>;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        if this.deadline.is_none() {
            this.deadline = Some(Box::pin(tokio::time::sleep(this.timeout)));
        }
        if let Some(deadline) = this.deadline.as_mut() {
            if deadline.as_mut().poll(cx).is_ready() {
                return Poll::Ready(Some(Err("idle read timeout on upstream body".into())));
            }
        }

        let frame = ready!(Pin::new(&mut this.inner).poll_frame(cx));
        this.deadline = None;
        Poll::Ready(frame.map(|result| result.map_err(Into::into)))
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> http_body::SizeHint {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A body that never produces a frame.
    struct StalledBody;

    impl http_body::Body for StalledBody {
        type Data = Bytes;
        type Error = Box<dyn std::error::Error + Send + Sync>;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
            Poll::Pending
        }
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn stalled_upstream_body_errors_out() {
        let body = Body::new(TimeoutBody::new(StalledBody, Duration::from_secs(30)));
        let result = axum::body::to_bytes(body, usize::MAX).await;
        assert!(result.is_err(), "a silent upstream must not hang the reader");
    }

    #[tokio::test]
    async fn flowing_body_passes_through() {
        let inner = Body::from("stream-bytes");
        let body = Body::new(TimeoutBody::new(inner, Duration::from_secs(30)));
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"stream-bytes");
    }

    #[test]
    fn connect_errors_map_to_unreachable() {
        // The mapping itself: a sanity pin on the two 502 flavors.
        let unreachable = ProxyError::UpstreamUnreachable("refused".into());
        let protocol = ProxyError::UpstreamProtocolError("bad header".into());
        assert_eq!(unreachable.status(), protocol.status());
        assert_ne!(unreachable.code(), protocol.code());
    }

    #[tokio::test]
    async fn forwarder_builds_with_default_timeouts() {
        let forwarder = Forwarder::new(&TimeoutConfig::default());
        assert!(forwarder.is_ok());
    }
}
