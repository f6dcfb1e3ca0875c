use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

/// Fixed-window per-key counter. One instance per limit tier, owned by the
/// application state.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    entries: DashMap<String, (u32, Instant)>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: DashMap::new(),
        }
    }

    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert((0, now));

        if now.duration_since(entry.1) > self.window {
            *entry = (1, now);
            return true;
        }

        entry.0 += 1;
        entry.0 <= self.max_requests
    }

    /// Drop windows that have long since closed, so the map doesn't grow
    /// with one entry per client forever.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) <= self.window);
    }
}

fn client_ip(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Applied to the whole API surface.
pub async fn global_rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(&request);
    if !state.global_limiter.check(&ip) {
        warn!(action = "rate_limit_exceeded", ip = %ip);
        return Err(AppError::RateLimited(
            "Too many requests from this IP, please try again later.".to_string(),
        ));
    }
    Ok(next.run(request).await)
}

/// Stricter limit layered on the authentication routes.
pub async fn auth_rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(&request);
    if !state.auth_limiter.check(&ip) {
        warn!(action = "auth_rate_limit_exceeded", ip = %ip);
        return Err(AppError::RateLimited(
            "Too many authentication attempts, please try again after 15 minutes.".to_string(),
        ));
    }
    Ok(next.run(request).await)
}
