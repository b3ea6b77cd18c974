//! Per-IP rate limiting backed by `governor` keyed limiters.
//!
//! The bucket key comes from `tower_governor`'s key extractors: the TCP peer
//! address by default, or the forwarding headers (`X-Forwarded-For`,
//! `X-Real-Ip`, `Forwarded`) when `RATE_LIMIT_TRUST_PROXY` says a reverse
//! proxy sets them. A request with no usable address is refused.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, RateLimiter};
use heightcert_config::RateLimitConfig;
use heightcert_core::AppError;
use tower_governor::key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor};

use crate::state::AppState;

pub type IpRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

#[derive(Clone)]
pub struct RateLimiters {
    pub general: Arc<IpRateLimiter>,
    pub auth: Arc<IpRateLimiter>,
    pub trust_proxy: bool,
}

impl RateLimiters {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            general: Arc::new(RateLimiter::keyed(config.general_quota())),
            auth: Arc::new(RateLimiter::keyed(config.auth_quota())),
            trust_proxy: config.trust_proxy,
        }
    }

    /// Periodically drops state for idle IPs so the key maps stay bounded.
    pub fn spawn_cleanup(&self, every: Duration) {
        let limiters = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(every).await;
                limiters.general.retain_recent();
                limiters.auth.retain_recent();
            }
        });
    }
}

fn client_ip(req: &Request, trust_proxy: bool) -> Option<IpAddr> {
    if trust_proxy {
        SmartIpKeyExtractor.extract(req).ok()
    } else {
        PeerIpKeyExtractor.extract(req).ok()
    }
}

async fn limit(
    limiters: &RateLimiters,
    limiter: &IpRateLimiter,
    scope: &'static str,
    req: Request,
    next: Next,
) -> Response {
    let Some(ip) = client_ip(&req, limiters.trust_proxy) else {
        tracing::error!(scope, "Unable to determine client address for rate limiting");
        return AppError::internal_error("Unable to determine client address").into_response();
    };

    if limiter.check_key(&ip).is_err() {
        crate::security_event!("rate_limited", client.ip = %ip, scope, "Rate limit exceeded");
        return AppError::new(
            StatusCode::TOO_MANY_REQUESTS,
            anyhow::anyhow!("Too many requests, please retry later"),
        )
        .into_response();
    }

    next.run(req).await
}

pub async fn general_rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let limiters = &state.rate_limiters;
    limit(limiters, &limiters.general, "general", req, next).await
}

pub async fn auth_rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let limiters = &state.rate_limiters;
    limit(limiters, &limiters.auth, "auth", req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use std::net::SocketAddr;

    fn request_from(peer: [u8; 4], forwarded_for: Option<&str>) -> Request {
        let mut builder = Request::builder();
        if let Some(forwarded) = forwarded_for {
            builder = builder.header("x-forwarded-for", forwarded);
        }
        let mut req = builder.body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 4000))));
        req
    }

    #[test]
    fn test_client_ip_ignores_forwarded_for_by_default() {
        let req = request_from([192, 168, 0, 9], Some("203.0.113.7"));
        assert_eq!(client_ip(&req, false), Some("192.168.0.9".parse().unwrap()));
    }

    #[test]
    fn test_client_ip_uses_forwarded_for_behind_trusted_proxy() {
        let req = request_from([10, 0, 0, 1], Some("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_ip(&req, true), Some("203.0.113.7".parse().unwrap()));

        let req = request_from([10, 0, 0, 1], None);
        assert_eq!(client_ip(&req, true), Some("10.0.0.1".parse().unwrap()));
    }

    #[test]
    fn test_client_ip_missing_without_peer() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_ip(&req, false), None);
    }

    #[test]
    fn test_limiter_burst() {
        let limiters = RateLimiters::new(&RateLimitConfig {
            general_per_second: 1,
            general_burst_size: 2,
            auth_per_second: 1,
            auth_burst_size: 1,
            trust_proxy: false,
        });
        let ip: IpAddr = "198.51.100.2".parse().unwrap();
        assert!(limiters.auth.check_key(&ip).is_ok());
        assert!(limiters.auth.check_key(&ip).is_err());
        assert!(limiters.general.check_key(&ip).is_ok());
        assert!(limiters.general.check_key(&ip).is_ok());
        assert!(limiters.general.check_key(&ip).is_err());
    }
}
