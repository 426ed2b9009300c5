use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::ConnectInfo,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use ballotbook_shared::constants::MAX_IP_ADDRESS_LEN;
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
        }
    }

    fn try_consume(&mut self, rate: f64, capacity: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.last_refill = now;

        self.tokens = (self.tokens + elapsed * rate).min(capacity);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Per-client-IP token buckets shared by every request.
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<IpAddr, TokenBucket>>>,
    rate: f64,
    capacity: f64,
    trust_forwarded_for: bool,
}

impl RateLimiter {
    pub fn new(rate: f64, capacity: f64, trust_forwarded_for: bool) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            rate,
            capacity,
            trust_forwarded_for,
        }
    }

    pub async fn check(&self, ip: IpAddr) -> bool {
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets
            .entry(ip)
            .or_insert_with(|| TokenBucket::new(self.capacity));
        bucket.try_consume(self.rate, self.capacity)
    }

    pub async fn purge_stale(&self, max_idle_secs: f64) {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        buckets.retain(|_, bucket| {
            now.duration_since(bucket.last_refill).as_secs_f64() < max_idle_secs
        });
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(10.0, 30.0, true)
    }
}

pub async fn rate_limit_middleware(
    axum::extract::State(limiter): axum::extract::State<RateLimiter>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0);

    if let Some(ip) = limiter_key(req.headers(), peer, limiter.trust_forwarded_for) {
        if !limiter.check(ip).await {
            warn!(ip = %ip, "Rate limit exceeded");
            return Err(StatusCode::TOO_MANY_REQUESTS);
        }
    }

    Ok(next.run(req).await)
}

/// Bucket key for a request: the forwarded address when it is a valid IP,
/// otherwise the peer address.
fn limiter_key(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> Option<IpAddr> {
    client_ip(headers, None, trust_forwarded_for)
        .and_then(|raw| raw.parse::<IpAddr>().ok())
        .or_else(|| peer.map(|addr| addr.ip()))
}

/// Client address as recorded on a ballot.
///
/// With `trust_forwarded_for`, the first `X-Forwarded-For` entry wins, then
/// `X-Real-IP`; the peer address is the fallback. At most
/// [`MAX_IP_ADDRESS_LEN`] characters are kept.
pub fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> Option<String> {
    let forwarded = trust_forwarded_for
        .then(|| {
            header_str(headers, "x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .or_else(|| header_str(headers, "x-real-ip").map(str::trim))
                .map(str::to_string)
        })
        .flatten();

    forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .map(|ip| ip.chars().take(MAX_IP_ADDRESS_LEN).collect())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::HeaderValue;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_rate_limiter_allows_burst() {
        let limiter = RateLimiter::new(10.0, 5.0, true);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();

        for _ in 0..5 {
            assert!(limiter.check(ip).await);
        }

        assert!(!limiter.check(ip).await);
    }

    #[tokio::test]
    async fn test_rate_limiter_different_ips() {
        let limiter = RateLimiter::new(10.0, 2.0, true);
        let ip1: IpAddr = "10.0.0.1".parse().unwrap();
        let ip2: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.check(ip1).await);
        assert!(limiter.check(ip1).await);
        assert!(!limiter.check(ip1).await);

        assert!(limiter.check(ip2).await);
    }

    #[tokio::test]
    async fn test_purge_stale() {
        let limiter = RateLimiter::new(10.0, 5.0, true);
        let ip: IpAddr = "192.168.1.1".parse().unwrap();
        assert!(limiter.check(ip).await);

        limiter.purge_stale(0.0).await;

        let buckets = limiter.buckets.lock().await;
        assert!(buckets.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_forwarded_for_is_limited_by_peer() {
        let limiter = RateLimiter::new(0.001, 2.0, true);
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                limiter,
                rate_limit_middleware,
            ));
        let peer: SocketAddr = "198.51.100.7:40000".parse().unwrap();

        let mut accepted = 0;
        for i in 0..50 {
            let mut req = Request::builder()
                .uri("/")
                .header("x-forwarded-for", format!("spoof-{i}"))
                .body(Body::empty())
                .unwrap();
            req.extensions_mut().insert(ConnectInfo(peer));
            let resp = app.clone().oneshot(req).await.unwrap();
            if resp.status() == StatusCode::OK {
                accepted += 1;
            } else {
                assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
            }
        }
        assert_eq!(accepted, 2);
    }

    #[test]
    fn test_limiter_key_prefers_valid_forwarded_ip() {
        let peer: SocketAddr = "10.0.0.1:5555".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));
        assert_eq!(
            limiter_key(&headers, Some(peer), true),
            Some("203.0.113.9".parse::<IpAddr>().unwrap())
        );
        assert_eq!(
            limiter_key(&headers, Some(peer), false),
            Some(peer.ip())
        );

        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        assert_eq!(limiter_key(&headers, Some(peer), true), Some(peer.ip()));
        assert_eq!(limiter_key(&headers, None, true), None);
    }

    #[test]
    fn test_client_ip_prefers_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        let peer: SocketAddr = "10.0.0.1:5555".parse().unwrap();

        assert_eq!(
            client_ip(&headers, Some(peer), true).as_deref(),
            Some("203.0.113.9")
        );
        assert_eq!(
            client_ip(&headers, Some(peer), false).as_deref(),
            Some("10.0.0.1")
        );
    }

    #[test]
    fn test_client_ip_truncates() {
        let mut headers = HeaderMap::new();
        let long = "a".repeat(60);
        headers.insert("x-forwarded-for", HeaderValue::from_str(&long).unwrap());

        let ip = client_ip(&headers, None, true).unwrap();
        assert_eq!(ip.len(), MAX_IP_ADDRESS_LEN);
    }

    #[test]
    fn test_client_ip_absent() {
        assert!(client_ip(&HeaderMap::new(), None, true).is_none());
    }
}
