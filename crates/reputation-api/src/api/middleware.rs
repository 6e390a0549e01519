//! Rate limiting, security headers and request logging.

use crate::config::RateLimitConfig;
use crate::error::ApiError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Rate limiter keyed by client IP.
pub type ClientLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// Headers added to every response.
const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("content-security-policy", "default-src 'self'"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("referrer-policy", "no-referrer"),
    (
        "strict-transport-security",
        "max-age=15552000; includeSubDomains",
    ),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-frame-options", "SAMEORIGIN"),
];

/// Rate limiter state shared across requests.
#[derive(Clone)]
pub struct RateLimitState {
    /// Per-client limiter
    pub clients: Arc<ClientLimiter>,
}

impl RateLimitState {
    /// Allow `max_requests` per client per `window`, refilling evenly.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let burst = NonZeroU32::new(max_requests).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(window / burst.get())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            clients: Arc::new(RateLimiter::keyed(quota)),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window)
    }

    /// Create a permissive rate limiter for testing.
    pub fn permissive() -> Self {
        Self::new(100_000, Duration::from_secs(60))
    }

    /// Periodically forget clients whose buckets have refilled.
    pub fn spawn_cleanup(&self, interval: Duration) -> JoinHandle<()> {
        let clients = self.clients.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                clients.retain_recent();
                clients.shrink_to_fit();
                debug!(tracked_clients = clients.len(), "Pruned rate limiter state");
            }
        })
    }
}

/// Peer IP of the request. Requests without connection info share one bucket.
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Rate limiting middleware.
///
/// Returns 429 Too Many Requests once a client exhausts its quota.
pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_ip(&request);

    if rate_limit.clients.check_key(&client).is_err() {
        warn!(%client, "Rate limit exceeded");
        return Err(ApiError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}

/// Add the standard security headers to a response.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(
            HeaderName::from_static(*name),
            HeaderValue::from_static(*value),
        );
    }

    response
}

/// Logging middleware for requests.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    debug!(%method, %uri, "Request started");

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_success() {
        debug!(%method, %uri, %status, ?duration, "Request completed");
    } else {
        warn!(%method, %uri, %status, ?duration, "Request failed");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    const OTHER: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

    #[test]
    fn test_rate_limit_state_creation() {
        let state = RateLimitState::new(10, Duration::from_secs(60));
        assert!(state.clients.check_key(&LOCALHOST).is_ok());
    }

    #[test]
    fn test_rate_limit_exhaustion_is_per_client() {
        let state = RateLimitState::new(2, Duration::from_secs(900));

        assert!(state.clients.check_key(&LOCALHOST).is_ok());
        assert!(state.clients.check_key(&LOCALHOST).is_ok());
        assert!(state.clients.check_key(&LOCALHOST).is_err());

        // Another client has its own quota
        assert!(state.clients.check_key(&OTHER).is_ok());
    }

    #[test]
    fn test_zero_limits_fall_back_to_one_request() {
        let state = RateLimitState::new(0, Duration::ZERO);
        assert!(state.clients.check_key(&LOCALHOST).is_ok());
    }

    #[test]
    fn test_permissive_rate_limit() {
        let state = RateLimitState::permissive();
        for _ in 0..100 {
            assert!(state.clients.check_key(&LOCALHOST).is_ok());
        }
    }

    #[tokio::test]
    async fn test_cleanup_forgets_refilled_clients() {
        let state = RateLimitState::new(1, Duration::from_millis(20));
        assert!(state.clients.check_key(&LOCALHOST).is_ok());
        assert!(state.clients.check_key(&OTHER).is_ok());
        assert_eq!(state.clients.len(), 2);

        // The limiter runs on its own clock, so let real time pass
        let cleanup = state.spawn_cleanup(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(200)).await;
        cleanup.abort();

        assert_eq!(state.clients.len(), 0);
        assert!(state.clients.check_key(&LOCALHOST).is_ok());
    }

    #[test]
    fn test_security_header_names_are_valid() {
        for (name, value) in SECURITY_HEADERS {
            assert!(HeaderName::from_bytes(name.as_bytes()).is_ok());
            assert!(HeaderValue::from_str(value).is_ok());
        }
    }
}
