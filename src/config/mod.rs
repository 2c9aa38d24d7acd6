//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment
//!     → env.rs (read & parse variables)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults so `ALLOWED_DOMAINS` alone is a working config
//! - Validation separates syntactic (parsing) from semantic checks

pub mod env;
pub mod schema;
pub mod validation;

pub use env::ConfigError;
pub use schema::{
    AllowlistConfig, AuthConfig, CorsConfig, ForwardingConfig, ListenerConfig,
    ObservabilityConfig, ProxyConfig, RateLimitConfig, TargetPathMode, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
