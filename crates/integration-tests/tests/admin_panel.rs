//! Admin panel access control served in-process.

#![allow(clippy::unwrap_used)]

use axum::http::{StatusCode, header};
use tower::ServiceExt;

use faqbase_integration_tests::{admin_state, body_text, get, settings};

async fn admin() -> axum::Router {
    faqbase_admin::app(admin_state(settings(&[])).await)
}

#[tokio::test]
async fn test_health_is_ok() {
    let response = admin().await.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_page_renders() {
    let response = admin().await.oneshot(get("/login")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("name=\"password\""));
}

#[tokio::test]
async fn test_pages_redirect_to_login() {
    let app = admin().await;
    for path in ["/", "/faqs", "/categories", "/config", "/updates"] {
        let response = app.clone().oneshot(get(path)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
    }
}

#[tokio::test]
async fn test_update_api_rejects_anonymous() {
    let app = admin().await;
    for path in ["/api/updates/versions", "/api/updates/health-check"] {
        let response = app.clone().oneshot(get(path)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_live_login_rejects_bad_credentials() {
    let base = faqbase_integration_tests::admin_base_url();
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let response = client
        .post(format!("{base}/login"))
        .form(&[("login", "nobody"), ("password", "wrong-password")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get("location").unwrap(),
        "/login?error=credentials"
    );
}
