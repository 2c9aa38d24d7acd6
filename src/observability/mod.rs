//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! logging.rs: tracing init + call-site redaction helpers
//! metrics.rs: Prometheus exposition + low-overhead recorders
//! ```
//!
//! # Design Decisions
//! - Redaction is part of this subsystem, not the callers': every log site
//!   formats through the helpers, so hardened mode is one flag
//! - Metrics are optional and off the hot path when disabled

pub mod logging;
pub mod metrics;
