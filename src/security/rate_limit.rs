//! Per-client sliding-window rate limiting middleware.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::ApiError;
use crate::http::server::AppState;

/// State for the sliding-window rate limiter.
///
/// One timestamp vector per client IP; entries older than the window are
/// pruned lazily on each check, and a key's memory is never reclaimed once
/// created. Coarse locking is fine at the request volume this service sees.
pub struct RateLimiterState {
    windows: Mutex<HashMap<IpAddr, Vec<Instant>>>,
    window: Duration,
    max_requests: usize,
}

impl RateLimiterState {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            window,
            max_requests,
        }
    }

    /// Admit or deny a request from `key`. A denied request is not recorded.
    pub fn admit(&self, key: IpAddr) -> bool {
        self.admit_at(key, Instant::now())
    }

    fn admit_at(&self, key: IpAddr, now: Instant) -> bool {
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        let stamps = windows.entry(key).or_default();

        let cutoff = now.checked_sub(self.window);
        if let Some(cutoff) = cutoff {
            stamps.retain(|stamp| *stamp > cutoff);
        }

        if stamps.len() >= self.max_requests {
            false
        } else {
            stamps.push(now);
            true
        }
    }
}

/// Middleware enforcing the limiter on every API route.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = addr.ip();
    if state.limiter.admit(key) {
        next.run(request).await
    } else {
        tracing::warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");
        state
            .audit
            .rate_limited(key, request.uri().path());
        ApiError::RateLimited.into_response()
    }
}
