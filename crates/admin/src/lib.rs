//! faqbase administration panel library.
//!
//! Editors manage FAQs, categories and tags here; super admins also
//! manage accounts, runtime settings and maintenance mode. Database
//! access, settings and tracking are shared with `faqbase-site`.
//!
//! # Security
//!
//! Only accounts with a staff role can log in. The panel listens on its
//! own port and should not be exposed publicly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, middleware::from_fn};
use tower_http::services::ServeDir;

use faqbase_site::middleware::{request_id_middleware, security_headers_middleware};
use faqbase_site::telemetry;

use crate::middleware::create_session_layer;
use crate::state::AppState;

/// Directory of static assets, relative to the working directory.
pub const STATIC_DIR: &str = "crates/admin/static";

/// Build the complete admin application.
///
/// Layers, from the outside in: Sentry, tracing, request id, sessions,
/// security headers.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());

    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(telemetry::trace_layer())
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
