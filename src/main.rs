use std::time::Duration;

use tokio::net::TcpListener;

use crossgate::config::ProxyConfig;
use crossgate::http::HttpServer;
use crossgate::lifecycle::signals;
use crossgate::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ProxyConfig::from_env()?;

    logging::init(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "crossgate starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        mount_prefix = %config.forwarding.mount_prefix,
        allowlist_entries = config.allowlist.domains.len(),
        rate_limit = config.rate_limit.max_requests,
        rate_window_secs = config.rate_limit.window_secs,
        hardened = config.hardened,
        auth_enabled = config.auth.api_key.is_some(),
        "Configuration loaded"
    );

    if config.allowlist.domains.is_empty() {
        tracing::warn!("ALLOWED_DOMAINS is empty: every target will be rejected");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let grace = Duration::from_secs(config.listener.shutdown_grace_secs);
    let server = HttpServer::new(config)?;
    server.run(listener, signals::shutdown_signal(grace)).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
