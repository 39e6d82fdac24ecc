//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database ping)
//!
//! # Delivery API
//! POST /api/delivery/resolve   - Resolve fee and ETA for an address or coordinate
//! GET  /api/delivery/zones     - Active zones for the fee table
//! ```

pub mod delivery;

use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

use crate::middleware::{api_rate_limiter, resolve_rate_limiter};
use crate::state::AppState;

/// Create the delivery API router.
///
/// `trust_proxy_headers` selects how rate limits identify the client; see
/// [`crate::middleware::rate_limit`].
pub fn delivery_routes(trust_proxy_headers: bool) -> Router<AppState> {
    let resolve = Router::new()
        .route("/resolve", post(delivery::resolve))
        .layer(resolve_rate_limiter(trust_proxy_headers));
    let zones = Router::new()
        .route("/zones", get(delivery::zones))
        .layer(api_rate_limiter(trust_proxy_headers));

    resolve.merge(zones).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    )
}

/// Create all routes for the storefront.
pub fn routes(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new().nest("/api/delivery", delivery_routes(trust_proxy_headers))
}
