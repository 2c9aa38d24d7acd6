//! Outbound request-line and header rewriting.
//!
//! # Responsibilities
//! - Strip the proxy's mount prefix from the forwarded path
//! - Build the outbound URI exclusively from the validated [`SafeTarget`]
//! - Inject `Host`, `X-Forwarded-For`/`X-Real-IP`, and a default `User-Agent`
//! - Drop the target-selection header, the proxy's own credential, and
//!   hop-by-hop headers
//!
//! # Design Decisions
//! - The addressing mode (inbound path vs. target-embedded path) is a fixed
//!   deployment choice, never a per-request fallback
//! - Inbound `X-Forwarded-*` values are replaced, not appended: the caller
//!   is untrusted
//! - Query filtering works on the raw string so untouched parameters keep
//!   their original encoding
//!
//! [`SafeTarget`]: crate::routing::resolver::SafeTarget

use std::net::IpAddr;

use axum::http::{header, request::Parts, HeaderMap, HeaderValue, Uri};

use crate::config::{ForwardingConfig, TargetPathMode};
use crate::error::ProxyError;
use crate::routing::resolver::ResolvedTarget;
use crate::security::auth::{API_KEY_HEADER, API_KEY_QUERY_PARAM};

/// Headers that are meaningful for one connection leg only and must be
/// recomputed by the outbound connection rather than forwarded.
pub(crate) const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Everything the forwarder needs besides method and body.
#[derive(Debug)]
pub struct OutboundParts {
    pub uri: Uri,
    pub headers: HeaderMap,
}

/// Compute the outbound request line and header set.
pub fn rewrite(
    resolved: &ResolvedTarget,
    inbound: &Parts,
    client_addr: IpAddr,
    config: &ForwardingConfig,
) -> Result<OutboundParts, ProxyError> {
    let path_and_query = match config.path_mode {
        TargetPathMode::Target => resolved
            .spec_path_and_query
            .clone()
            .unwrap_or_else(|| "/".to_string()),
        TargetPathMode::Inbound => {
            let path = strip_mount_prefix(inbound.uri.path(), &config.mount_prefix);
            let dropped = [
                config.target_query_param.as_str(),
                API_KEY_QUERY_PARAM,
            ];
            match filtered_query(inbound.uri.query(), &dropped) {
                Some(query) => format!("{path}?{query}"),
                None => path,
            }
        }
    };

    let authority = resolved.target.authority();
    let uri = Uri::builder()
        .scheme(resolved.target.scheme().as_str())
        .authority(authority.as_str())
        .path_and_query(path_and_query.as_str())
        .build()
        .map_err(|e| ProxyError::Internal(format!("outbound uri: {e}")))?;

    let mut headers = inbound.headers.clone();
    headers.remove(config.target_header.as_str());
    headers.remove(API_KEY_HEADER);
    headers.remove(header::HOST);
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(*name);
    }

    headers.insert(
        header::HOST,
        HeaderValue::from_str(&authority)
            .map_err(|e| ProxyError::Internal(format!("host header: {e}")))?,
    );

    let client = HeaderValue::from_str(&client_addr.to_string())
        .map_err(|e| ProxyError::Internal(format!("forwarded-for header: {e}")))?;
    headers.insert("x-forwarded-for", client.clone());
    headers.insert("x-real-ip", client);

    if !headers.contains_key(header::USER_AGENT) {
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&config.default_user_agent)
                .map_err(|e| ProxyError::Internal(format!("user-agent header: {e}")))?,
        );
    }

    Ok(OutboundParts { uri, headers })
}

/// Remove the mount prefix at a segment boundary; `/api/x` → `/x`.
fn strip_mount_prefix(path: &str, prefix: &str) -> String {
    match path.strip_prefix(prefix) {
        Some("") => "/".to_string(),
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => path.to_string(),
    }
}

/// Drop proxy-addressing parameters from a raw query string, preserving the
/// encoding of everything kept.
fn filtered_query(query: Option<&str>, drop_keys: &[&str]) -> Option<String> {
    let query = query?;
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or(pair);
            !drop_keys.iter().any(|drop| key.eq_ignore_ascii_case(drop))
        })
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use crate::routing::allowlist::DomainAllowlist;
    use crate::routing::resolver::resolve;

    fn resolved(spec: &str) -> ResolvedTarget {
        let allowlist = DomainAllowlist::parse([".xtream-codes.com", "127.0.0.1"]);
        resolve(Some(spec), &allowlist).unwrap()
    }

    fn inbound(uri: &str) -> Parts {
        Request::builder()
            .uri(uri)
            .header("X-Target-Url", "http://live.xtream-codes.com:8080")
            .header("X-Api-Key", "sekret")
            .header("Connection", "keep-alive")
            .header("Cookie", "session=1")
            .body(Body::empty())
            .unwrap()
            .into_parts()
            .0
    }

    fn client() -> IpAddr {
        "203.0.113.9".parse().unwrap()
    }

    #[test]
    fn strips_mount_prefix_at_segment_boundary() {
        assert_eq!(strip_mount_prefix("/api/player_api.php", "/api"), "/player_api.php");
        assert_eq!(strip_mount_prefix("/api", "/api"), "/");
        assert_eq!(strip_mount_prefix("/apiary", "/api"), "/apiary");
        assert_eq!(strip_mount_prefix("/other", "/api"), "/other");
    }

    #[test]
    fn builds_uri_from_safe_target_only() {
        let config = ForwardingConfig::default();
        let out = rewrite(
            &resolved("http://live.xtream-codes.com:8080"),
            &inbound("/api/player_api.php?action=x"),
            client(),
            &config,
        )
        .unwrap();

        assert_eq!(
            out.uri.to_string(),
            "http://live.xtream-codes.com:8080/player_api.php?action=x"
        );
    }

    #[test]
    fn injects_and_strips_headers() {
        let config = ForwardingConfig::default();
        let out = rewrite(
            &resolved("http://live.xtream-codes.com:8080"),
            &inbound("/api/player_api.php"),
            client(),
            &config,
        )
        .unwrap();

        assert_eq!(
            out.headers.get(header::HOST).unwrap(),
            "live.xtream-codes.com:8080"
        );
        assert_eq!(out.headers.get("x-forwarded-for").unwrap(), "203.0.113.9");
        assert_eq!(out.headers.get("x-real-ip").unwrap(), "203.0.113.9");
        assert!(out.headers.get("x-target-url").is_none());
        assert!(out.headers.get("x-api-key").is_none());
        assert!(out.headers.get("connection").is_none());
        // Ordinary headers survive.
        assert_eq!(out.headers.get("cookie").unwrap(), "session=1");
    }

    #[test]
    fn default_user_agent_fills_the_gap() {
        let config = ForwardingConfig::default();
        let out = rewrite(
            &resolved("http://live.xtream-codes.com:8080"),
            &inbound("/api/x"),
            client(),
            &config,
        )
        .unwrap();
        assert!(out
            .headers
            .get(header::USER_AGENT)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("Mozilla/5.0"));

        // A caller-supplied agent is left alone.
        let mut parts = inbound("/api/x");
        parts
            .headers
            .insert(header::USER_AGENT, HeaderValue::from_static("VLC/3.0"));
        let out = rewrite(
            &resolved("http://live.xtream-codes.com:8080"),
            &parts,
            client(),
            &config,
        )
        .unwrap();
        assert_eq!(out.headers.get(header::USER_AGENT).unwrap(), "VLC/3.0");
    }

    #[test]
    fn proxy_addressing_parameters_leave_the_query() {
        let config = ForwardingConfig::default();
        let out = rewrite(
            &resolved("http://live.xtream-codes.com:8080"),
            &inbound("/api/x?action=get&api_key=sekret&target_url=http%3A%2F%2Ffoo&u=a%20b"),
            client(),
            &config,
        )
        .unwrap();

        let query = out.uri.query().unwrap();
        assert_eq!(query, "action=get&u=a%20b");
    }

    #[test]
    fn target_path_mode_uses_the_spec_path() {
        let mut config = ForwardingConfig::default();
        config.path_mode = TargetPathMode::Target;

        let out = rewrite(
            &resolved("http://live.xtream-codes.com:8080/custom/feed?z=1"),
            &inbound("/api/ignored?also=ignored"),
            client(),
            &config,
        )
        .unwrap();
        assert_eq!(
            out.uri.to_string(),
            "http://live.xtream-codes.com:8080/custom/feed?z=1"
        );

        // No embedded path means the origin root.
        let out = rewrite(
            &resolved("http://live.xtream-codes.com:8080"),
            &inbound("/api/ignored"),
            client(),
            &config,
        )
        .unwrap();
        assert_eq!(out.uri.path(), "/");
    }
}
