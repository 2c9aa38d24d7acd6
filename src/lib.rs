//! crossgate: a dynamic reverse proxy for browser clients.
//!
//! Accepts requests carrying a caller-supplied upstream target (via the
//! `X-Target-Url` header or a query parameter), validates it against a
//! domain allowlist, and forwards the request to that origin with the
//! header surgery browsers cannot do themselves (`Host`, `User-Agent`,
//! CORS on the way back).
//!
//! # Pipeline
//! ```text
//! inbound request
//!     → security::rate_limit (admit/reject per client)
//!     → security::auth       (API key, when configured)
//!     → routing::resolver    (untrusted spec → SafeTarget, or reject)
//!     → routing::rewrite     (request line + header policy)
//!     → http::forward        (dial SafeTarget's origin only, stream back)
//!     → http::response       (strip leaky headers, inject CORS)
//!     → client
//! ```
//!
//! The dialed origin derives exclusively from the validated `SafeTarget`;
//! the raw target string never reaches the connection layer.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
