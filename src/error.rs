//! Request-level error taxonomy.
//!
//! # Responsibilities
//! - One variant per rejection the proxy can produce
//! - Stable machine-readable `code` for every variant
//! - Structured JSON rendering (`{"code", "message"}`) for clients
//!
//! # Design Decisions
//! - Upstream and internal detail never reaches a hardened deployment's
//!   clients; the variants keep the detail for logging
//! - `IntoResponse` defaults to the hardened rendering so middleware
//!   without config access cannot leak

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Every way a proxied request can be rejected or fail.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("no target URL was supplied")]
    MissingTarget,

    #[error("the target URL is not a valid absolute URL")]
    MalformedTarget,

    #[error("the target scheme must be http or https")]
    DisallowedScheme,

    #[error("the target host is not on the domain allowlist")]
    DomainNotAllowlisted,

    #[error("rate limit exceeded, retry later")]
    RateLimited,

    #[error("missing or invalid API key")]
    Unauthorized,

    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("upstream protocol error: {0}")]
    UpstreamProtocolError(String),

    #[error("internal proxy error: {0}")]
    Internal(String),
}

impl ProxyError {
    /// Stable identifier surfaced in the JSON `code` field.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingTarget => "missing_target",
            Self::MalformedTarget => "malformed_target",
            Self::DisallowedScheme => "disallowed_scheme",
            Self::DomainNotAllowlisted => "domain_not_allowlisted",
            Self::RateLimited => "rate_limited",
            Self::Unauthorized => "unauthorized",
            Self::UpstreamUnreachable(_) => "upstream_unreachable",
            Self::UpstreamProtocolError(_) => "upstream_protocol_error",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingTarget | Self::MalformedTarget | Self::DisallowedScheme => {
                StatusCode::BAD_REQUEST
            }
            Self::DomainNotAllowlisted => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::UpstreamUnreachable(_) | Self::UpstreamProtocolError(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Hardened deployments get the generic
    /// text for variants that carry upstream or internal detail.
    fn client_message(&self, hardened: bool) -> String {
        match self {
            Self::UpstreamUnreachable(_) if hardened => "upstream unreachable".to_string(),
            Self::UpstreamProtocolError(_) if hardened => {
                "upstream returned an invalid response".to_string()
            }
            Self::Internal(_) if hardened => "internal proxy error".to_string(),
            other => other.to_string(),
        }
    }

    /// Render the structured JSON rejection for a deployment.
    pub fn response(&self, hardened: bool) -> Response {
        let body = Json(json!({
            "code": self.code(),
            "message": self.client_message(hardened),
        }));
        (self.status(), body).into_response()
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        self.response(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ProxyError::MissingTarget.code(), "missing_target");
        assert_eq!(ProxyError::DomainNotAllowlisted.code(), "domain_not_allowlisted");
        assert_eq!(ProxyError::RateLimited.code(), "rate_limited");
        assert_eq!(
            ProxyError::UpstreamUnreachable("x".into()).code(),
            "upstream_unreachable"
        );
    }

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(ProxyError::MissingTarget.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ProxyError::MalformedTarget.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ProxyError::DomainNotAllowlisted.status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ProxyError::RateLimited.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(ProxyError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ProxyError::UpstreamUnreachable("refused".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn hardened_mode_hides_upstream_detail() {
        let err = ProxyError::UpstreamUnreachable("dns error for internal-host.local".into());
        assert!(err.client_message(false).contains("internal-host.local"));
        assert!(!err.client_message(true).contains("internal-host.local"));

        let err = ProxyError::Internal("poisoned lock at rate_limit.rs".into());
        assert_eq!(err.client_message(true), "internal proxy error");
    }
}
