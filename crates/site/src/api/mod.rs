//! JSON API.
//!
//! # Route Structure
//!
//! ```text
//! /api/v2/...        REST endpoints (see [`v2`])
//! /api.php?action=   Legacy action dispatch (see [`legacy`])
//! ```
//!
//! Every endpoint answers 503 while `api.enabled` is off. List endpoints
//! answer 404 with an empty array when there is nothing to list. Write
//! endpoints need the `x-faq-token` header to match `api.clientToken`.

pub mod legacy;
pub mod v2;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tower_sessions::Session;

use faqbase_core::TrackingAction;

use crate::error::AppError;
use crate::services::{VisitorContext, VisitorTracker};
use crate::settings::Settings;
use crate::state::AppState;

/// Header carrying the API client token.
pub const TOKEN_HEADER: &str = "x-faq-token";

/// Version of the REST API.
pub const API_VERSION: u32 = 2;

/// A request to the enabled API.
///
/// Carries the settings and what the tracker needs to record the call.
pub struct ApiCall {
    pub settings: Arc<Settings>,
    session: Session,
    visitor: VisitorContext,
}

impl ApiCall {
    /// Record the call in the visitor tracker.
    pub async fn track(&self, state: &AppState, data: &str) {
        VisitorTracker::new(state.pool(), state.tracking())
            .track(
                &self.settings,
                &self.session,
                &self.visitor,
                None,
                TrackingAction::Api,
                data,
            )
            .await;
    }

    /// The request's session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Configured site language.
    #[must_use]
    pub fn lang(&self) -> Option<&str> {
        Some(self.settings.language.as_str())
    }
}

impl FromRequestParts<AppState> for ApiCall {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let settings = state.settings().load().await?;
        if !settings.api_enabled {
            return Err(AppError::ServiceUnavailable("API is disabled".to_string()));
        }
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;
        let Ok(visitor) = VisitorContext::from_request_parts(parts, state).await;

        Ok(Self {
            settings,
            session,
            visitor,
        })
    }
}

/// Proof that the request carries the configured client token.
///
/// An empty `api.clientToken` disables every write endpoint.
pub struct ApiToken;

impl FromRequestParts<AppState> for ApiToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let settings = state.settings().load().await?;
        let presented = parts
            .headers
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if token_matches(&settings.api_client_token, presented) {
            Ok(Self)
        } else {
            Err(AppError::Unauthorized("missing or invalid API token".to_string()))
        }
    }
}

/// Compare tokens without short-circuiting on the first differing byte.
fn token_matches(expected: &str, presented: &str) -> bool {
    if expected.is_empty() || expected.len() != presented.len() {
        return false;
    }
    expected
        .bytes()
        .zip(presented.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// A list response: 200 with the items, or 404 with `[]` when empty.
#[must_use]
pub fn list_response<T: Serialize>(items: Vec<T>) -> Response {
    let status = if items.is_empty() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };
    (status, Json(items)).into_response()
}

/// Build the complete API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/api/v2", v2::router())
        .merge(legacy::router())
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    #[test]
    fn test_token_matching() {
        assert!(token_matches("s3cret-token", "s3cret-token"));
        assert!(!token_matches("s3cret-token", "s3cret-tokeN"));
        assert!(!token_matches("s3cret-token", "s3cret"));
        assert!(!token_matches("", ""));
    }

    #[tokio::test]
    async fn test_empty_list_is_not_found() {
        let response = list_response(Vec::<u32>::new());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), 1024).await.unwrap_or_default();
        assert_eq!(&body[..], b"[]");
    }

    #[tokio::test]
    async fn test_non_empty_list_is_ok() {
        let response = list_response(vec![1, 2]);
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024).await.unwrap_or_default();
        assert_eq!(&body[..], b"[1,2]");
    }
}
