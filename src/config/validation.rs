//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (parsing handles syntactic)
//! - Validate value ranges (windows and timeouts > 0, addresses parse)
//! - Enforce hardening prerequisites (CORS origins must be pinned)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - An empty allowlist is NOT an error: the resolver fails closed and
//!   rejects every target, which startup logging makes loud

use std::net::SocketAddr;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration for semantic problems.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            "must be a socket address",
        ));
    }

    let prefix = &config.forwarding.mount_prefix;
    if !prefix.starts_with('/') || prefix.len() < 2 {
        errors.push(ValidationError::new(
            "forwarding.mount_prefix",
            "must start with '/' and name at least one segment",
        ));
    }
    if prefix.ends_with('/') || prefix.contains('{') {
        errors.push(ValidationError::new(
            "forwarding.mount_prefix",
            "must not end with '/' or contain route parameters",
        ));
    }

    for domain in &config.allowlist.domains {
        if domain.contains('/') || domain.contains(char::is_whitespace) {
            errors.push(ValidationError::new(
                "allowlist.domains",
                format!("{domain:?} is not a hostname or suffix pattern"),
            ));
        }
    }

    if config.rate_limit.enabled {
        if config.rate_limit.max_requests == 0 {
            errors.push(ValidationError::new(
                "rate_limit.max_requests",
                "must be greater than zero",
            ));
        }
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::new(
                "rate_limit.window_secs",
                "must be greater than zero",
            ));
        }
    }

    if config.timeouts.connect_secs == 0
        || config.timeouts.response_header_secs == 0
        || config.timeouts.idle_read_secs == 0
    {
        errors.push(ValidationError::new(
            "timeouts",
            "all timeouts must be greater than zero",
        ));
    }

    if config.hardened && config.cors.allowed_origins.is_empty() {
        errors.push(ValidationError::new(
            "cors.allowed_origins",
            "required in production: wildcard CORS is refused when hardened",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = ProxyConfig::default();
        config.forwarding.mount_prefix = "api/".to_string();
        config.rate_limit.window_secs = 0;
        config.timeouts.connect_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3, "expected all errors, got {errors:?}");
    }

    #[test]
    fn hardened_requires_pinned_origins() {
        let mut config = ProxyConfig::default();
        config.hardened = true;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "cors.allowed_origins"));

        config.cors.allowed_origins = vec!["https://player.example.com".to_string()];
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_allowlist_entries_with_paths() {
        let mut config = ProxyConfig::default();
        config.allowlist.domains = vec!["example.com/api".to_string()];
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn empty_allowlist_is_legal() {
        // Deny-all is a deliberate fail-closed state, not a config error.
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }
}
