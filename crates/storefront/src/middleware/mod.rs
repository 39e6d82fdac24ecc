//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` with [`request_id::http_span`]
//! 3. Request ID
//! 4. Rate limiting (governor), per route group

pub mod rate_limit;
pub mod request_id;

pub use rate_limit::{api_rate_limiter, resolve_rate_limiter};
pub use request_id::{http_span, request_id_middleware};
