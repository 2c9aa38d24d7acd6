//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create the Axum router with the mount-prefix routes and liveness
//!   endpoints
//! - Wire up middleware in pipeline order: trace → request ID → panic
//!   catcher → rate limiter → auth → handler
//! - Run the resolve → rewrite → forward → sanitize pipeline per request
//! - Serve with graceful shutdown

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, Method};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use http_body_util::Limited;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::forward::Forwarder;
use crate::http::health::{health_handler, root_banner};
use crate::http::response;
use crate::observability::{logging, metrics};
use crate::routing::allowlist::{AllowlistHandle, DomainAllowlist};
use crate::routing::{resolver, rewrite};
use crate::security::auth::api_key_middleware;
use crate::security::rate_limit::{rate_limit_middleware, RateLimiterState};

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ProxyConfig>,
    pub allowlist: Arc<AllowlistHandle>,
    pub limiter: Arc<RateLimiterState>,
    pub forwarder: Arc<Forwarder>,
    pub started_at: Instant,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> std::io::Result<Self> {
        let allowlist = DomainAllowlist::parse(&config.allowlist.domains);
        let forwarder = Forwarder::new(&config.timeouts)?;
        let limiter = RateLimiterState::new(config.rate_limit.clone());

        let state = AppState {
            config: Arc::new(config),
            allowlist: Arc::new(AllowlistHandle::new(allowlist)),
            limiter: Arc::new(limiter),
            forwarder: Arc::new(forwarder),
            started_at: Instant::now(),
        };

        Ok(Self {
            router: Self::build_router(state),
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let prefix = state.config.forwarding.mount_prefix.clone();

        let api = Router::new()
            .route(&prefix, any(proxy_handler))
            .route(&format!("{prefix}/{{*path}}"), any(proxy_handler))
            .layer(
                ServiceBuilder::new()
                    .layer(middleware::from_fn_with_state(
                        state.limiter.clone(),
                        rate_limit_middleware,
                    ))
                    .layer(middleware::from_fn_with_state(
                        state.clone(),
                        api_key_middleware,
                    )),
            )
            .with_state(state.clone());

        Router::new()
            .route("/", get(root_banner))
            .route("/health", get(health_handler))
            .with_state(state)
            .merge(api)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(CatchPanicLayer::custom(handle_panic)),
            )
    }

    /// Run the server until the shutdown future resolves, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler: resolve the target, rewrite, forward, sanitize.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
) -> Response {
    let start = Instant::now();
    let hardened = state.config.hardened;
    let method = request.method().clone();
    let origin = request.headers().get(header::ORIGIN).cloned();

    if method == Method::OPTIONS {
        return response::preflight(&state.config.cors, origin.as_ref(), hardened);
    }

    let raw_spec = resolver::extract_target_spec(&request, &state.config.forwarding);

    let allowlist = state.allowlist.snapshot();
    let resolved = match resolver::resolve(raw_spec.as_deref(), &allowlist) {
        Ok(resolved) => resolved,
        Err(err) => {
            tracing::warn!(
                client = %addr.ip(),
                code = err.code(),
                target = %raw_spec
                    .as_deref()
                    .map(|raw| logging::display_target(raw, hardened))
                    .unwrap_or_else(|| "<none>".to_string()),
                "Target rejected"
            );
            metrics::record_rejected(err.code());
            metrics::record_request(method.as_str(), err.status().as_u16(), start);
            return err.response(hardened);
        }
    };

    let (parts, body) = request.into_parts();
    let outbound = match rewrite::rewrite(&resolved, &parts, addr.ip(), &state.config.forwarding) {
        Ok(outbound) => outbound,
        Err(err) => {
            tracing::error!(client = %addr.ip(), code = err.code(), "Rewrite failed");
            metrics::record_request(method.as_str(), err.status().as_u16(), start);
            return err.response(hardened);
        }
    };

    tracing::debug!(
        client = %addr.ip(),
        authority = %resolved.target.authority(),
        path = %logging::display_path(
            outbound.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/"),
            hardened,
        ),
        "Forwarding request"
    );

    let body = Body::new(Limited::new(body, state.config.forwarding.max_body_size));

    match state.forwarder.forward(method.clone(), outbound, body).await {
        Ok(mut upstream) => {
            response::sanitize(
                upstream.headers_mut(),
                &state.config.cors,
                origin.as_ref(),
                hardened,
            );
            metrics::record_request(method.as_str(), upstream.status().as_u16(), start);
            upstream
        }
        Err(err) => {
            if hardened {
                tracing::error!(client = %addr.ip(), code = err.code(), "Upstream request failed");
            } else {
                tracing::error!(
                    client = %addr.ip(),
                    code = err.code(),
                    error = %err,
                    "Upstream request failed"
                );
            }
            metrics::record_rejected(err.code());
            metrics::record_request(method.as_str(), err.status().as_u16(), start);
            err.response(hardened)
        }
    }
}

/// Final guard: a panicking handler becomes a structured 500 instead of a
/// dropped connection.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| err.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    tracing::error!(detail = %detail, "Handler panicked");
    ProxyError::Internal("handler panicked".to_string()).into_response()
}
