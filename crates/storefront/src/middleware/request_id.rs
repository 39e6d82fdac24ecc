//! Request correlation ids.
//!
//! An upstream `x-request-id` is kept; otherwise a UUID v4 is generated. The
//! id is recorded on the HTTP span, tagged on the Sentry scope and echoed in
//! the response so checkout can quote it in support requests.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Span for one HTTP request, with an empty `request_id` field filled in by
/// [`request_id_middleware`].
pub fn http_span<B>(request: &axum::http::Request<B>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = tracing::field::Empty,
        status = tracing::field::Empty,
    )
}

/// Ensure every request carries a request id.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;
    Span::current().record("status", response.status().as_u16());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
