//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (admit/reject per client address)
//!     → auth.rs (API key, when configured)
//!     → Pass to target resolution
//! ```
//!
//! # Design Decisions
//! - Rate limiting runs first: unauthenticated floods never reach auth
//! - Fail closed: any check failure is a terminal JSON rejection
//! - No trust in client input (addresses come from the socket, not headers)

pub mod auth;
pub mod rate_limit;

pub use rate_limit::RateLimiterState;
