//! Public site and JSON API served in-process.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use std::net::IpAddr;

use faqbase_integration_tests::{
    CLIENT_IP, PROXY_IP, body_text, get, get_from, peer, settings, site_state,
    site_state_with_proxies,
};
use faqbase_site::api::{API_VERSION, TOKEN_HEADER};
use faqbase_site::settings::keys;

async fn site(overrides: &[(&str, &str)]) -> axum::Router {
    faqbase_site::app(site_state(settings(overrides)).await)
}

#[tokio::test]
async fn test_health_is_ok() {
    let response = site(&[]).await.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_version_title_and_language() {
    let app = site(&[(keys::TITLE, "Help Center"), (keys::LANGUAGE, "de")]).await;

    let response = app.clone().oneshot(get("/api/v2/version")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let version: String = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(version, env!("CARGO_PKG_VERSION"));

    let response = app.clone().oneshot(get("/api/v2/title")).await.unwrap();
    assert_eq!(body_text(response).await, "\"Help Center\"");

    let response = app.oneshot(get("/api/v2/language")).await.unwrap();
    assert_eq!(body_text(response).await, "\"de\"");
}

#[tokio::test]
async fn test_disabled_api_is_unavailable() {
    let app = site(&[(keys::API_ENABLED, "false")]).await;
    let response = app.clone().oneshot(get("/api/v2/version")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app.oneshot(get("/api.php?action=getVersion")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_legacy_dispatch() {
    let app = site(&[]).await;

    let response = app
        .clone()
        .oneshot(get("/api.php?action=getApiVersion"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, API_VERSION.to_string());

    let response = app
        .oneshot(get("/api.php?action=dropTables"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_write_requires_token() {
    let app = site(&[(keys::API_CLIENT_TOKEN, "s3cret-token")]).await;
    let request = |token: Option<&str>| {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/v2/category")
            .extension(peer(CLIENT_IP))
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        builder
            .body(Body::from(r#"{"name":"Billing","lang":"en"}"#))
            .unwrap()
    };

    let response = app.clone().oneshot(request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.oneshot(request(Some("wrong-token!"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_banned_client_is_forbidden() {
    let app = site(&[(keys::BANNED_IPS, "192.0.2.0/24")]).await;

    let response = app.clone().oneshot(get("/api/v2/title")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_forwarded_header_from_untrusted_peer_is_ignored() {
    let app = site(&[(keys::BANNED_IPS, "192.0.2.0/24")]).await;

    let mut request = get("/api/v2/title");
    request
        .headers_mut()
        .insert("x-forwarded-for", "203.0.113.5".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_forwarded_header_from_trusted_proxy() {
    let state = site_state_with_proxies(
        settings(&[(keys::BANNED_IPS, "198.51.100.0/24")]),
        "10.0.0.0/8",
    )
    .await;
    let app = faqbase_site::app(state);
    let from_proxy = |client: &str| {
        let mut request = get_from(PROXY_IP, "/api/v2/title");
        request
            .headers_mut()
            .insert("x-forwarded-for", client.parse().unwrap());
        request
    };

    let response = app.clone().oneshot(from_proxy("198.51.100.9")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.clone().oneshot(from_proxy("203.0.113.5")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Outside the trusted range the same header is the peer's own claim.
    let untrusted: IpAddr = "198.51.100.9".parse().unwrap();
    let mut request = get_from(untrusted, "/api/v2/title");
    request
        .headers_mut()
        .insert("x-forwarded-for", "203.0.113.5".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_maintenance_mode() {
    let app = site(&[(keys::MAINTENANCE_MODE, "true"), (keys::TITLE, "Help Center")]).await;

    let response = app.clone().oneshot(get("/api/v2/title")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(body_text(response).await.contains("Help Center"));

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_security_headers() {
    let response = site(&[]).await.oneshot(get("/health")).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key("x-request-id"));
}

// =============================================================================
// Against a running server
// =============================================================================

#[tokio::test]
#[ignore = "Requires running site server with seeded database"]
async fn test_live_categories_listed() {
    let base = faqbase_integration_tests::site_base_url();
    let response = reqwest::get(format!("{base}/api/v2/categories")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let categories: Vec<serde_json::Value> = response.json().await.unwrap();
    assert!(categories.iter().any(|c| c["name"] == "Getting started"));
}

#[tokio::test]
#[ignore = "Requires running site server with seeded database"]
async fn test_live_search_finds_seeded_faq() {
    let base = faqbase_integration_tests::site_base_url();
    let response = reqwest::get(format!("{base}/api/v2/search?q=password"))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let hits: Vec<serde_json::Value> = response.json().await.unwrap();
    assert!(!hits.is_empty());
}
