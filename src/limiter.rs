use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::AppState;

/// Fixed global quota per caller identity.
pub const MAX_REQUESTS_PER_WINDOW: u32 = 100;

/// Length of the rolling window.
pub const WINDOW: Duration = Duration::from_secs(60);

// Prune dead windows once the store grows past this.
const PRUNE_THRESHOLD: usize = 1024;

/// One caller's counter inside the current window.
#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    count: u32,
    window_start: Instant,
}

/// RateLimiter
///
/// Fixed-window request counter shared across all concurrent requests.
/// Created once at startup and injected through the application state; tests
/// build and drop their own instances.
#[derive(Clone, Default)]
pub struct RateLimiter {
    store: Arc<Mutex<HashMap<String, WindowRecord>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// check
    ///
    /// Counts one request for `caller` and reports whether it is still within
    /// quota. The counter and window reset are performed under one lock so
    /// concurrent requests from the same caller observe a consistent count.
    pub fn check(&self, caller: &str) -> bool {
        let mut store = self.store.lock().expect("rate limiter lock");
        let now = Instant::now();

        if store.len() > PRUNE_THRESHOLD {
            store.retain(|_, record| now.duration_since(record.window_start) < WINDOW * 2);
        }

        let record = store.entry(caller.to_string()).or_insert(WindowRecord {
            count: 0,
            window_start: now,
        });

        if now.duration_since(record.window_start) >= WINDOW {
            record.count = 0;
            record.window_start = now;
        }

        if record.count >= MAX_REQUESTS_PER_WINDOW {
            return false;
        }
        record.count += 1;
        true
    }
}

/// caller_identity
///
/// Resolves the caller identity the quota is keyed by: forwarded headers
/// first (the service normally sits behind a proxy), then the peer address.
fn caller_identity(request: &Request) -> String {
    if let Some(forwarded_for) = request.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded_for.to_str() {
            if let Some(first) = value.split(',').next() {
                return first.trim().to_string();
            }
        }
    }

    if let Some(real_ip) = request.headers().get("x-real-ip") {
        if let Ok(value) = real_ip.to_str() {
            return value.trim().to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// rate_limit
///
/// Middleware applied to every route. A caller over quota receives 429 and
/// the wrapped handler is never invoked.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let caller = caller_identity(&request);

    if !state.limiter.check(&caller) {
        tracing::warn!(%caller, "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests. Try again in a minute.",
        )
            .into_response();
    }

    next.run(request).await
}
