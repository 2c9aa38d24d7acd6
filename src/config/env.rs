//! Environment-driven configuration loading.
//!
//! # Data Flow
//! ```text
//! process environment
//!     → from_env (parse each variable over the defaults)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//! ```
//!
//! Unset variables keep their defaults; set-but-invalid variables are an
//! error rather than a silent fallback.

use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Listener port (address is always 0.0.0.0).
pub const PORT: &str = "PORT";
/// Comma-separated allowlist entries; suffix entries carry a leading dot.
pub const ALLOWED_DOMAINS: &str = "ALLOWED_DOMAINS";
/// Comma-separated CORS origins, required when hardened.
pub const ALLOWED_ORIGINS: &str = "ALLOWED_ORIGINS";
/// Optional API key gating the proxy mount.
pub const API_KEY: &str = "API_KEY";
/// "production" switches on hardened mode.
pub const APP_ENV: &str = "APP_ENV";
/// Path prefix the proxy is mounted under.
pub const MOUNT_PREFIX: &str = "MOUNT_PREFIX";
/// "inbound" or "target" addressing (see [`TargetPathMode`]).
///
/// [`TargetPathMode`]: crate::config::schema::TargetPathMode
pub const TARGET_PATH_MODE: &str = "TARGET_PATH_MODE";

/// Rate limiting.
pub const RATE_LIMIT_REQUESTS: &str = "RATE_LIMIT_REQUESTS";
pub const RATE_LIMIT_WINDOW_SECS: &str = "RATE_LIMIT_WINDOW_SECS";

/// Outbound timeouts.
pub const CONNECT_TIMEOUT_SECS: &str = "CONNECT_TIMEOUT_SECS";
pub const RESPONSE_HEADER_TIMEOUT_SECS: &str = "RESPONSE_HEADER_TIMEOUT_SECS";
pub const IDLE_READ_TIMEOUT_SECS: &str = "IDLE_READ_TIMEOUT_SECS";

/// Lifecycle and limits.
pub const SHUTDOWN_GRACE_SECS: &str = "SHUTDOWN_GRACE_SECS";
pub const MAX_BODY_SIZE: &str = "MAX_BODY_SIZE";

/// Observability.
pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const METRICS_ENABLED: &str = "METRICS_ENABLED";
pub const METRICS_ADDRESS: &str = "METRICS_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ProxyConfig {
    /// Load and validate configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = ProxyConfig::default();

        if let Some(port) = parse_var::<u16>(PORT)? {
            config.listener.bind_address = format!("0.0.0.0:{port}");
        }
        if let Some(grace) = parse_var(SHUTDOWN_GRACE_SECS)? {
            config.listener.shutdown_grace_secs = grace;
        }

        if let Some(domains) = var(ALLOWED_DOMAINS) {
            config.allowlist.domains = split_csv(&domains);
        }
        if let Some(origins) = var(ALLOWED_ORIGINS) {
            config.cors.allowed_origins = split_csv(&origins);
        }
        config.auth.api_key = var(API_KEY);
        config.hardened = var(APP_ENV)
            .map(|env| env.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        if let Some(prefix) = var(MOUNT_PREFIX) {
            config.forwarding.mount_prefix = prefix;
        }
        if let Some(mode) = var(TARGET_PATH_MODE) {
            config.forwarding.path_mode = mode.parse().map_err(|_| ConfigError::Invalid {
                name: TARGET_PATH_MODE,
                value: mode,
            })?;
        }
        if let Some(size) = parse_var(MAX_BODY_SIZE)? {
            config.forwarding.max_body_size = size;
        }

        if let Some(max) = parse_var(RATE_LIMIT_REQUESTS)? {
            config.rate_limit.max_requests = max;
        }
        if let Some(window) = parse_var(RATE_LIMIT_WINDOW_SECS)? {
            config.rate_limit.window_secs = window;
        }

        if let Some(secs) = parse_var(CONNECT_TIMEOUT_SECS)? {
            config.timeouts.connect_secs = secs;
        }
        if let Some(secs) = parse_var(RESPONSE_HEADER_TIMEOUT_SECS)? {
            config.timeouts.response_header_secs = secs;
        }
        if let Some(secs) = parse_var(IDLE_READ_TIMEOUT_SECS)? {
            config.timeouts.idle_read_secs = secs;
        }

        if let Some(level) = var(LOG_LEVEL) {
            config.observability.log_level = level;
        }
        if let Some(enabled) = parse_var(METRICS_ENABLED)? {
            config.observability.metrics_enabled = enabled;
        }
        if let Some(address) = var(METRICS_ADDRESS) {
            config.observability.metrics_address = address;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;

        Ok(config)
    }
}

/// Read a variable, treating unset and blank the same.
fn var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match var(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

pub(crate) fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_splitting_trims_and_drops_blanks() {
        assert_eq!(
            split_csv(".xtream-codes.com, live.example.com ,,"),
            vec![".xtream-codes.com".to_string(), "live.example.com".to_string()]
        );
        assert!(split_csv("  ").is_empty());
    }

    #[test]
    fn config_error_joins_validation_messages() {
        let errors = vec![
            ValidationError::new("rate_limit.window_secs", "must be greater than zero"),
            ValidationError::new("forwarding.mount_prefix", "must start with '/'"),
        ];
        let message = ConfigError::Validation(errors).to_string();
        assert!(message.contains("rate_limit.window_secs"));
        assert!(message.contains("mount_prefix"));
    }
}
