//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware chain)
//!     → routing (resolve target, rewrite request line + headers)
//!     → forward.rs (dial the validated origin, stream the response)
//!     → response.rs (sanitize headers, apply CORS)
//!     → Send to client
//! ```

pub mod forward;
pub mod health;
pub mod response;
pub mod server;

pub use forward::Forwarder;
pub use server::{AppState, HttpServer};
