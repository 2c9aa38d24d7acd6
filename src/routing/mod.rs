//! Target routing subsystem: the SSRF-guard pipeline.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → resolver.rs (extract raw target spec: header, then query)
//!     → allowlist.rs (is the host permitted at all?)
//!     → resolver.rs (SafeTarget: validated scheme/host/port)
//!     → rewrite.rs (outbound request line + header policy)
//!     → http::forward (dials SafeTarget's origin, nothing else)
//! ```
//!
//! # Design Decisions
//! - Resolve-then-rewrite, never string concatenation: the dialed origin
//!   comes only from the validated `SafeTarget`
//! - Reject by default: no allowlist match means no forwarding

pub mod allowlist;
pub mod resolver;
pub mod rewrite;

pub use allowlist::{AllowlistHandle, DomainAllowlist};
pub use resolver::{ResolvedTarget, SafeTarget};
pub use rewrite::OutboundParts;
