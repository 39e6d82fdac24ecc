//! HTTP behaviour of the delivery API that needs no database round trip.

#![allow(clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use pizzeria_storefront::config::{GeocodingConfig, StorefrontConfig};
use pizzeria_storefront::routes;
use pizzeria_storefront::state::AppState;

fn app_with(trust_proxy_headers: bool) -> axum::Router {
    let config = StorefrontConfig {
        database_url: SecretString::from("postgres://localhost/pizzeria_test".to_string()),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        trust_proxy_headers,
        geocoding: GeocodingConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
    };
    // Never connects unless a handler touches the database.
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/pizzeria_test")
        .unwrap();
    let state = AppState::new(config, pool).unwrap();
    routes::routes(trust_proxy_headers).with_state(state)
}

fn app() -> axum::Router {
    app_with(true)
}

fn resolve_request(body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/delivery/resolve")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> JsonValue {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_empty_input_is_bad_request() {
    let response = app().oneshot(resolve_request("{}")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["method"], "error");
    assert_eq!(body["deliverable"], false);
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn test_invalid_coordinate_is_bad_request() {
    let response = app()
        .oneshot(resolve_request(
            r#"{"coordinate": {"latitude": 123.0, "longitude": 0.0}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid_input");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let response = app()
        .oneshot(resolve_request(r#"{"addressText": "#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["method"], "error");
    assert!(body.get("fee").is_none());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let request = Request::builder()
        .uri("/api/delivery/nope")
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_direct_deployment_keys_on_peer_address() {
    let mut request = resolve_request("{}");
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 9], 51000))));

    let response = app_with(false).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "invalid_input");
}
