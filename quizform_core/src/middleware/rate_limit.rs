//! Per-IP sliding-window rate limiting.
//!
//! Each limiter remembers the instants of recent requests per client and
//! admits a request while fewer than `max_requests` fall inside the window.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use parking_lot::Mutex;
use serde_json::json;
use tracing::warn;

use crate::config::{RateLimitConfig, RateLimitRule};

struct Windows {
    hits: HashMap<IpAddr, Vec<Instant>>,
    last_sweep: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    scope: &'static str,
    windows: Arc<Mutex<Windows>>,
    enabled: bool,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(scope: &'static str, enabled: bool, rule: RateLimitRule) -> Self {
        Self::with_window(
            scope,
            enabled,
            rule.max_requests as usize,
            Duration::from_secs(rule.window_seconds),
        )
    }

    fn with_window(scope: &'static str, enabled: bool, max_requests: usize, window: Duration) -> Self {
        Self {
            scope,
            windows: Arc::new(Mutex::new(Windows {
                hits: HashMap::new(),
                last_sweep: Instant::now(),
            })),
            enabled,
            max_requests,
            window,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn scope(&self) -> &'static str {
        self.scope
    }

    /// Records a request from `ip`, returning the remaining allowance.
    pub fn check(&self, ip: IpAddr) -> Result<usize, RateLimitError> {
        let now = Instant::now();
        let mut windows = self.windows.lock();

        // Once per window, forget clients whose every hit has expired.
        if now.duration_since(windows.last_sweep) >= self.window {
            let window = self.window;
            windows
                .hits
                .retain(|_, hits| hits.last().is_some_and(|&last| now.duration_since(last) < window));
            windows.last_sweep = now;
        }

        let entries = windows.hits.entry(ip).or_default();
        entries.retain(|&instant| now.duration_since(instant) < self.window);

        if entries.len() >= self.max_requests {
            let oldest = entries.first().copied().unwrap_or(now);
            let reset_in = self.window.saturating_sub(now.duration_since(oldest));

            return Err(RateLimitError {
                scope: self.scope,
                retry_after_seconds: reset_in.as_secs().max(1),
                limit: self.max_requests,
            });
        }

        entries.push(now);
        Ok(self.max_requests - entries.len())
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.windows.lock().hits.len()
    }
}

/// The three budgets: every request, credential routes and search routes.
#[derive(Clone)]
pub struct RateLimits {
    pub api: RateLimiter,
    pub auth: RateLimiter,
    pub search: RateLimiter,
}

impl RateLimits {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            api: RateLimiter::new("api", config.enabled, config.api()),
            auth: RateLimiter::new("auth", config.enabled, config.auth),
            search: RateLimiter::new("search", config.enabled, config.search),
        }
    }
}

#[derive(Debug)]
pub struct RateLimitError {
    pub scope: &'static str,
    pub retry_after_seconds: u64,
    pub limit: usize,
}

fn insert_header(response: &mut Response, name: &'static str, value: impl ToString) {
    if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(name), value);
    }
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let status = StatusCode::TOO_MANY_REQUESTS;
        let subject = match self.scope {
            "auth" => "authentication attempts",
            "search" => "search requests",
            _ => "requests",
        };
        let body = Json(json!({
            "error": format!(
                "Too many {}. Please retry after {} seconds",
                subject, self.retry_after_seconds
            ),
            "status": status.as_u16(),
            "reason": "rate_limited",
        }));

        let mut response = (status, body).into_response();
        insert_header(&mut response, "x-ratelimit-limit", self.limit);
        insert_header(&mut response, "x-ratelimit-remaining", 0);
        insert_header(&mut response, "retry-after", self.retry_after_seconds);
        response
    }
}

/// Requests without connection info are not limited.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let Some(ip) = ip.filter(|_| limiter.is_enabled()) else {
        return Ok(next.run(request).await);
    };

    let remaining = limiter.check(ip).map_err(|e| {
        warn!(%ip, scope = limiter.scope(), "rate limit exceeded");
        e
    })?;

    let mut response = next.run(request).await;
    insert_header(&mut response, "x-ratelimit-limit", limiter.max_requests);
    insert_header(&mut response, "x-ratelimit-remaining", remaining);

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> RateLimiter {
        RateLimiter::new(
            "api",
            true,
            RateLimitRule {
                max_requests,
                window_seconds: 60,
            },
        )
    }

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = limiter(3);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        assert_eq!(limiter.check(ip).unwrap(), 2);
        assert_eq!(limiter.check(ip).unwrap(), 1);
        assert_eq!(limiter.check(ip).unwrap(), 0);

        let err = limiter.check(ip).unwrap_err();
        assert_eq!(err.limit, 3);
        assert!(err.retry_after_seconds >= 1);
    }

    #[test]
    fn test_limits_are_per_ip() {
        let limiter = limiter(1);
        let first: IpAddr = "10.0.0.1".parse().unwrap();
        let second: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.check(first).is_ok());
        assert!(limiter.check(first).is_err());
        assert!(limiter.check(second).is_ok());
    }

    #[test]
    fn test_expired_clients_are_forgotten() {
        let limiter = RateLimiter::with_window("api", true, 2, Duration::from_millis(20));

        for n in 1..=5u8 {
            limiter.check(IpAddr::from([10, 0, 0, n])).unwrap();
        }
        assert_eq!(limiter.tracked_clients(), 5);

        std::thread::sleep(Duration::from_millis(40));

        let returning: IpAddr = "10.0.0.9".parse().unwrap();
        assert_eq!(limiter.check(returning).unwrap(), 1);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_scopes_take_their_own_budgets() {
        let limits = RateLimits::new(&RateLimitConfig::default());
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        for _ in 0..10 {
            limits.auth.check(ip).unwrap();
        }
        let err = limits.auth.check(ip).unwrap_err();
        assert_eq!(err.scope, "auth");
        assert_eq!(err.limit, 10);

        assert_eq!(limits.search.check(ip).unwrap(), 29);
        assert_eq!(limits.api.check(ip).unwrap(), 99);
    }

    #[test]
    fn test_rejection_carries_retry_after() {
        let response = RateLimitError {
            scope: "search",
            retry_after_seconds: 42,
            limit: 10,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("retry-after").unwrap(), "42");
    }
}
