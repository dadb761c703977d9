//! faqbase public site library.
//!
//! Serves the knowledge base pages and the JSON API. The admin binary
//! reuses the database layer, settings and services from here.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod settings;
pub mod state;
pub mod telemetry;

use axum::{Extension, Router, middleware::from_fn, middleware::from_fn_with_state};
use tower_http::services::ServeDir;

use crate::middleware::client_ip::TrustedProxies;
use crate::middleware::session::SESSION_COOKIE_NAME;
use crate::middleware::{
    create_session_layer, request_id_middleware, security_headers_middleware,
    site_gate_middleware,
};
use crate::state::AppState;

/// Directory of static assets, relative to the working directory.
pub const STATIC_DIR: &str = "crates/site/static";

/// Build the complete site application.
///
/// Layers, from the outside in: Sentry, trusted proxies, tracing, request
/// id, sessions, security headers, ban and maintenance gate.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(
        state.pool(),
        SESSION_COOKIE_NAME,
        &state.config().base_url,
        middleware::session::SESSION_EXPIRY_SECONDS,
    );
    let trusted_proxies = TrustedProxies::new(state.config().trusted_proxies.clone());

    Router::new()
        .merge(routes::routes())
        .merge(api::router())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(from_fn_with_state(state.clone(), site_gate_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(telemetry::trace_layer())
        .layer(Extension(trusted_proxies))
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
