//! Per-client rate limiting using governor and `tower_governor`.
//!
//! Every resolve request may cost a paid geocoding call, so it gets a tighter
//! budget than the read-only endpoints.
//!
//! Proxy headers are client-controlled unless a proxy in front of the service
//! overwrites them, so they are only read when `STOREFRONT_TRUST_PROXY_HEADERS`
//! says such a proxy exists. Otherwise the socket peer address is the key.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Proxy headers carrying the real client IP, most trusted first.
const CLIENT_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

/// Key extractor for the client IP.
///
/// With `trust_proxy_headers` set, proxy headers are read first (for
/// `x-forwarded-for` the first address in the chain). The socket peer address
/// is used otherwise, when the server was started with connect info.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor {
    trust_proxy_headers: bool,
}

impl ClientIpKeyExtractor {
    #[must_use]
    pub const fn new(trust_proxy_headers: bool) -> Self {
        Self {
            trust_proxy_headers,
        }
    }

    fn forwarded_ip<T>(req: &Request<T>) -> Option<IpAddr> {
        let headers = req.headers();
        CLIENT_IP_HEADERS.iter().find_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        })
    }
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        self.trust_proxy_headers
            .then(|| Self::forwarded_ip(req))
            .flatten()
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter for delivery resolution: ~30 requests per minute per IP.
///
/// # Panics
///
/// Never panics: `per_second(2)` and `burst_size(10)` are valid positive values.
#[must_use]
pub fn resolve_rate_limiter(trust_proxy_headers: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(trust_proxy_headers))
        .per_second(2) // 1 token every 2 seconds
        .burst_size(10)
        .finish()
        .expect("rate limiter config with per_second(2) and burst_size(10) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Rate limiter for read-only API endpoints: ~60 requests per minute per IP.
///
/// # Panics
///
/// Never panics: `per_second(1)` and `burst_size(30)` are valid positive values.
#[must_use]
pub fn api_rate_limiter(trust_proxy_headers: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(trust_proxy_headers))
        .per_second(1)
        .burst_size(30)
        .finish()
        .expect("rate limiter config with per_second(1) and burst_size(30) is valid");
    GovernorLayer::new(Arc::new(config))
}
