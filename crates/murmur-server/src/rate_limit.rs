//! Per-client request throttling.
//!
//! Each client gets a token bucket. Callers with a well-formed identity
//! header are keyed by user id so users behind one NAT do not starve each
//! other. Anything else, including a header that does not parse as a user
//! id, falls back to the peer address.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::warn;

use murmur_shared::UserId;

use crate::api::AppState;
use crate::auth::identity_from_headers;
use crate::error::ServerError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClientKey {
    User(UserId),
    Ip(IpAddr),
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    touched: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<ClientKey, Bucket>>>,
    per_sec: f64,
    burst: f64,
}

impl RateLimiter {
    /// Non-finite or negative rates fall back to no refill, and the burst
    /// is at least one token, so a bad setting never disables the limiter.
    pub fn new(per_sec: f64, burst: f64) -> Self {
        let per_sec = if per_sec.is_finite() && per_sec >= 0.0 {
            per_sec
        } else {
            warn!(per_sec, "Invalid refill rate, refill disabled");
            0.0
        };
        let burst = if burst.is_finite() && burst >= 1.0 {
            burst
        } else {
            warn!(burst, "Invalid burst size, using 1");
            1.0
        };

        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            per_sec,
            burst,
        }
    }

    /// Take one token for `key`. Returns `false` when the bucket is empty.
    pub async fn allow(&self, key: ClientKey) -> bool {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets.entry(key).or_insert(Bucket {
            tokens: self.burst,
            touched: now,
        });

        let refill = now.duration_since(bucket.touched).as_secs_f64() * self.per_sec;
        bucket.tokens = (bucket.tokens + refill).min(self.burst);
        bucket.touched = now;

        if bucket.tokens < 1.0 {
            return false;
        }
        bucket.tokens -= 1.0;
        true
    }

    /// Forget clients idle for longer than `max_idle`.
    pub async fn evict_idle(&self, max_idle: Duration) {
        let now = Instant::now();
        self.buckets
            .lock()
            .await
            .retain(|_, bucket| now.duration_since(bucket.touched) < max_idle);
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.buckets.lock().await.len()
    }
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ServerError> {
    if let Some(key) = client_key(&req, &state.config.identity_header) {
        if !state.rate_limiter.allow(key.clone()).await {
            warn!(client = ?key, "Rate limit exceeded");
            return Err(ServerError::RateLimited);
        }
    }

    Ok(next.run(req).await)
}

/// Identity header first, then ConnectInfo, X-Forwarded-For and X-Real-IP.
fn client_key<B>(req: &Request<B>, identity_header: &str) -> Option<ClientKey> {
    if let Ok(user) = identity_from_headers(req.headers(), identity_header) {
        return Some(ClientKey::User(user));
    }

    let header_str = |name: &str| req.headers().get(name).and_then(|v| v.to_str().ok());

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return Some(ClientKey::Ip(addr.ip()));
    }

    header_str("x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .or_else(|| header_str("x-real-ip"))
        .and_then(|value| value.trim().parse::<IpAddr>().ok())
        .map(ClientKey::Ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64) -> ClientKey {
        ClientKey::User(UserId(id))
    }

    #[tokio::test]
    async fn test_burst_then_reject() {
        let limiter = RateLimiter::new(0.0, 3.0);
        for _ in 0..3 {
            assert!(limiter.allow(user(1)).await);
        }
        assert!(!limiter.allow(user(1)).await);
    }

    #[tokio::test]
    async fn test_clients_are_independent() {
        let limiter = RateLimiter::new(0.0, 1.0);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        assert!(limiter.allow(user(1)).await);
        assert!(!limiter.allow(user(1)).await);
        assert!(limiter.allow(user(2)).await);
        assert!(limiter.allow(ClientKey::Ip(ip)).await);
    }

    #[tokio::test]
    async fn test_evict_idle() {
        let limiter = RateLimiter::new(10.0, 5.0);
        assert!(limiter.allow(user(1)).await);

        limiter.evict_idle(Duration::from_secs(60)).await;
        assert_eq!(limiter.tracked().await, 1);

        limiter.evict_idle(Duration::ZERO).await;
        assert_eq!(limiter.tracked().await, 0);
    }

    #[test]
    fn test_client_key_precedence() {
        let req = Request::builder()
            .header("x-user-id", "5")
            .header("x-forwarded-for", "1.2.3.4")
            .body(())
            .unwrap();
        assert_eq!(client_key(&req, "x-user-id"), Some(user(5)));

        let req = Request::builder()
            .header("x-forwarded-for", "1.2.3.4, 10.0.0.1")
            .body(())
            .unwrap();
        assert_eq!(
            client_key(&req, "x-user-id"),
            Some(ClientKey::Ip("1.2.3.4".parse().unwrap()))
        );

        let req = Request::builder()
            .header("x-real-ip", "9.9.9.9")
            .body(())
            .unwrap();
        assert_eq!(
            client_key(&req, "x-user-id"),
            Some(ClientKey::Ip("9.9.9.9".parse().unwrap()))
        );

        let req = Request::builder().body(()).unwrap();
        assert_eq!(client_key(&req, "x-user-id"), None);
    }

    #[test]
    fn test_unparseable_identity_falls_back_to_ip() {
        let req = Request::builder()
            .header("x-user-id", "garbage")
            .header("x-forwarded-for", "1.2.3.4")
            .body(())
            .unwrap();
        assert_eq!(
            client_key(&req, "x-user-id"),
            Some(ClientKey::Ip("1.2.3.4".parse().unwrap()))
        );
    }

    #[tokio::test]
    async fn test_rotating_identity_header_shares_one_bucket() {
        let limiter = RateLimiter::new(0.0, 1.0);
        let mut allowed = 0;
        for i in 0..50 {
            let req = Request::builder()
                .header("x-user-id", format!("garbage-{i}"))
                .header("x-forwarded-for", "1.2.3.4")
                .body(())
                .unwrap();
            let key = client_key(&req, "x-user-id").unwrap();
            if limiter.allow(key).await {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 1);
        assert_eq!(limiter.tracked().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_rates_keep_limiter_closed() {
        let limiter = RateLimiter::new(f64::NAN, f64::NAN);
        assert!(limiter.allow(user(1)).await);
        for _ in 0..20 {
            assert!(!limiter.allow(user(1)).await);
        }

        let limiter = RateLimiter::new(-5.0, 0.0);
        assert!(limiter.allow(user(2)).await);
        assert!(!limiter.allow(user(2)).await);
    }
}
