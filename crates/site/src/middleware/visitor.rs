//! Visitor extraction and the ban/maintenance gate.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::client_ip;
use crate::error::AppError;
use crate::services::VisitorContext;
use crate::state::AppState;

/// Paths served even when the client is banned or the site is in
/// maintenance.
const UNGATED_PREFIXES: &[&str] = &["/health", "/static/"];

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

impl<S> FromRequestParts<S> for VisitorContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            ip: client_ip::resolve_or_unspecified(&parts.headers, &parts.extensions),
            user_agent: header_string(&parts.headers, header::USER_AGENT),
            referer: header_string(&parts.headers, header::REFERER),
            query: parts.uri.query().unwrap_or_default().to_owned(),
        })
    }
}

/// Reject banned clients with 403 and answer 503 while the site is in
/// maintenance mode.
pub async fn site_gate_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if UNGATED_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return next.run(request).await;
    }

    let settings = match state.settings().load().await {
        Ok(settings) => settings,
        Err(e) => return AppError::Database(e).into_response(),
    };

    let ip = client_ip::resolve_or_unspecified(request.headers(), request.extensions());
    if settings.banned_ips().is_banned(ip) {
        tracing::info!(%ip, "Rejected banned client");
        return AppError::Forbidden("Access denied".to_string()).into_response();
    }
    if settings.maintenance_mode {
        return AppError::ServiceUnavailable(format!(
            "{} is down for maintenance",
            settings.title
        ))
        .into_response();
    }

    next.run(request).await
}
