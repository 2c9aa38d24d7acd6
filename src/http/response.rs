//! Upstream response sanitization and CORS policy.
//!
//! # Responsibilities
//! - Strip headers that leak upstream implementation detail (`Server`,
//!   `X-Powered-By`) or would plant cross-origin cookies (`Set-Cookie`)
//! - Strip hop-by-hop headers; the connection back to the caller recomputes
//!   its own
//! - Inject the CORS response headers browser clients need
//! - Answer CORS preflights without touching the resolver or the network
//!
//! # Design Decisions
//! - Non-hardened deployments answer `Access-Control-Allow-Origin: *`
//! - Hardened deployments echo the request origin only when it is on the
//!   configured list, and emit `Vary: Origin` so caches keep the split

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Response, StatusCode};

use crate::config::CorsConfig;
use crate::routing::rewrite::HOP_BY_HOP_HEADERS;

/// Upstream headers never returned to the caller.
const STRIPPED_RESPONSE_HEADERS: &[&str] = &["server", "x-powered-by", "set-cookie"];

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str =
    "Origin, X-Requested-With, Content-Type, Accept, Authorization, X-Target-Url, X-Api-Key";

/// Sanitize an upstream response's headers in place.
pub fn sanitize(
    headers: &mut HeaderMap,
    cors: &CorsConfig,
    request_origin: Option<&HeaderValue>,
    hardened: bool,
) {
    for name in STRIPPED_RESPONSE_HEADERS {
        headers.remove(*name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(*name);
    }
    apply_cors(headers, cors, request_origin, hardened);
}

/// Terminal response for an `OPTIONS` preflight.
pub fn preflight(
    cors: &CorsConfig,
    request_origin: Option<&HeaderValue>,
    hardened: bool,
) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    apply_cors(response.headers_mut(), cors, request_origin, hardened);
    response
}

fn apply_cors(
    headers: &mut HeaderMap,
    cors: &CorsConfig,
    request_origin: Option<&HeaderValue>,
    hardened: bool,
) {
    let allow_origin = if hardened {
        request_origin
            .and_then(|origin| origin.to_str().ok())
            .filter(|origin| cors.allowed_origins.iter().any(|allowed| allowed == origin))
            .and_then(|origin| HeaderValue::from_str(origin).ok())
    } else {
        Some(HeaderValue::from_static("*"))
    };

    if let Some(origin) = allow_origin {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        if hardened {
            headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        }
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
}
