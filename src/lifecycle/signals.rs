//! OS signal handling.
//!
//! # Responsibilities
//! - Translate SIGTERM/Ctrl-C into the graceful-shutdown sequence
//! - Force-exit once the drain grace period expires
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - The watchdog is spawned only after a signal arrives, so a healthy
//!   process carries no timer

use std::time::Duration;

/// Resolve on SIGTERM or Ctrl-C.
///
/// On return the server should stop accepting and drain in-flight requests;
/// a watchdog force-exits the process if draining outlives `grace`.
pub async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!(
        grace_secs = grace.as_secs(),
        "Shutdown signal received, draining in-flight requests"
    );

    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        tracing::error!("Grace period expired with requests still in flight, forcing exit");
        std::process::exit(1);
    });
}
