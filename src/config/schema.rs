//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits; every section has defaults so a minimal
//! deployment (just `ALLOWED_DOMAINS`) works out of the box.

use serde::{Deserialize, Serialize};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, shutdown grace).
    pub listener: ListenerConfig,

    /// Forwarding behavior (mount prefix, target selection, header policy).
    pub forwarding: ForwardingConfig,

    /// Domain allowlist entries.
    pub allowlist: AllowlistConfig,

    /// CORS response policy.
    pub cors: CorsConfig,

    /// Optional API-key authentication.
    pub auth: AuthConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Production hardening: redacted logs, generic error bodies,
    /// origin-checked CORS.
    pub hardened: bool,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Seconds in-flight requests get to finish after a shutdown signal.
    pub shutdown_grace_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            shutdown_grace_secs: 5,
        }
    }
}

/// Which path the outbound request line is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TargetPathMode {
    /// Forward the inbound path (mount prefix stripped) and query.
    #[default]
    Inbound,

    /// Forward the path and query embedded in the target URL itself.
    Target,
}

impl std::str::FromStr for TargetPathMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inbound" => Ok(Self::Inbound),
            "target" => Ok(Self::Target),
            _ => Err(()),
        }
    }
}

/// Forwarding behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardingConfig {
    /// Path prefix the proxy is mounted under; stripped before forwarding.
    pub mount_prefix: String,

    /// Request header carrying the target URL.
    pub target_header: String,

    /// Query parameter carrying the target URL for clients that cannot set
    /// headers. The header wins when both are present.
    pub target_query_param: String,

    /// Fixed per-deployment addressing mode.
    pub path_mode: TargetPathMode,

    /// User-Agent injected when the inbound request has none. Some upstreams
    /// reject empty or proxy-identifying agents.
    pub default_user_agent: String,

    /// Maximum inbound request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            mount_prefix: "/api".to_string(),
            target_header: "x-target-url".to_string(),
            target_query_param: "target_url".to_string(),
            path_mode: TargetPathMode::Inbound,
            default_user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
            max_body_size: 2 * 1024 * 1024,
        }
    }
}

/// Domain allowlist entries.
///
/// Entries starting with a dot are suffix patterns (".example.com" matches
/// "sub.example.com"); everything else matches exactly. Empty list means
/// every target is rejected.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AllowlistConfig {
    pub domains: Vec<String>,
}

/// CORS response policy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to read responses. Ignored (wildcard) unless the
    /// deployment is hardened, where the list is required.
    pub allowed_origins: Vec<String>,
}

/// Optional API-key authentication for the proxy mount.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Requests must present this key when set.
    pub api_key: Option<String>,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Maximum requests per client per window.
    pub max_requests: u32,

    /// Window duration in seconds.
    pub window_secs: u64,

    /// Expired windows are pruned once the map grows past this many clients.
    pub max_tracked_clients: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 15 * 60,
            max_tracked_clients: 10_000,
        }
    }
}

/// Timeout configuration for the outbound leg.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// TCP connect (incl. DNS and TLS) timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream to produce response headers.
    pub response_header_secs: u64,

    /// Maximum gap between response body chunks.
    pub idle_read_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            response_header_secs: 30,
            idle_read_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus exposition listener.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
