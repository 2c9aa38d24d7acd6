//! Optional API-key authentication for the proxy mount.

use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ProxyError;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Header carrying the proxy credential. Stripped before forwarding.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Query fallback for clients that cannot set headers. Stripped from the
/// forwarded query string.
pub const API_KEY_QUERY_PARAM: &str = "api_key";

/// Reject requests without the configured API key. Passthrough when no key
/// is configured. CORS preflights pass: browsers send them without
/// credentials.
pub async fn api_key_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.auth.api_key.as_deref() else {
        return next.run(request).await;
    };
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            let query = request.uri().query()?;
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == API_KEY_QUERY_PARAM)
                .map(|(_, value)| value.into_owned())
        });

    match presented {
        Some(key) if key == expected => next.run(request).await,
        _ => {
            tracing::warn!("Request rejected: missing or invalid API key");
            metrics::record_rejected(ProxyError::Unauthorized.code());
            ProxyError::Unauthorized.into_response()
        }
    }
}
