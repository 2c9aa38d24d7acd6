//! Fixed-window rate limiting keyed by client address.
//!
//! # Algorithm
//! Each client owns a window `{count, window_start}`. A request after the
//! window elapsed starts a fresh window with count 1. Inside the window the
//! count is incremented on every attempt and the request is admitted while
//! `count <= max_requests`, so the 101st request in a default window is the
//! first rejection.
//!
//! # Memory Management
//! The map would otherwise grow with every distinct client address; once it
//! passes `max_tracked_clients`, expired windows are pruned before inserting
//! new ones.
//!
//! # Thread Safety
//! One mutex around the whole map keeps increment-and-compare atomic for
//! concurrent requests from the same client. The lock is held only for the
//! map operation, never across await points.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::config::RateLimitConfig;
use crate::error::ProxyError;
use crate::observability::metrics;

/// Per-client window state.
#[derive(Debug)]
struct RateWindow {
    count: u32,
    window_start: Instant,
}

/// Injectable rate-limit store; shared across the handler chain via `Arc`.
#[derive(Debug)]
pub struct RateLimiterState {
    windows: Mutex<HashMap<String, RateWindow>>,
    config: RateLimitConfig,
}

impl RateLimiterState {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Admit or reject one attempt from `client`.
    pub fn admit(&self, client: &str) -> bool {
        self.check(client, Instant::now())
    }

    fn check(&self, client: &str, now: Instant) -> bool {
        let window = Duration::from_secs(self.config.window_secs);
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");

        if windows.len() >= self.config.max_tracked_clients && !windows.contains_key(client) {
            windows.retain(|_, w| now.duration_since(w.window_start) < window);
        }

        match windows.get_mut(client) {
            Some(entry) => {
                if now.duration_since(entry.window_start) >= window {
                    entry.window_start = now;
                    entry.count = 1;
                    true
                } else {
                    entry.count = entry.count.saturating_add(1);
                    entry.count <= self.config.max_requests
                }
            }
            None => {
                windows.insert(
                    client.to_string(),
                    RateWindow {
                        count: 1,
                        window_start: now,
                    },
                );
                true
            }
        }
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.windows.lock().expect("rate limiter mutex poisoned").len()
    }
}

/// Middleware admitting or rejecting requests before target resolution.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiterState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.enabled() {
        return next.run(request).await;
    }

    let client = addr.ip().to_string();
    if limiter.admit(&client) {
        next.run(request).await
    } else {
        tracing::warn!(client = %client, "Rate limit exceeded");
        metrics::record_rate_limited();
        ProxyError::RateLimited.into_response()
    }
}
