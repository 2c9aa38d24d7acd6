//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Bind → Serve
//!
//! Shutdown (shutdown.rs + signals.rs):
//!     SIGTERM/Ctrl-C → stop accepting → drain in-flight up to the grace
//!     period → exit (forced if the drain stalls)
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
