//! Authentication extractors for admin.
//!
//! Only staff accounts (`super_admin` and `editor`) can hold an admin
//! session; the login handler refuses members.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use faqbase_core::UserRole;
use faqbase_site::models::CurrentUser;

/// Session key of the logged-in staff user.
pub const CURRENT_ADMIN: &str = "current_admin";

/// Extractor that requires a logged-in editor or super admin.
///
/// If nobody is logged in, returns a redirect to the login page for HTML
/// requests, or 401 Unauthorized for API requests.
///
/// ```rust,ignore
/// async fn protected_handler(RequireStaff(admin): RequireStaff) -> impl IntoResponse {
///     format!("Hello, {}!", admin.display_name)
/// }
/// ```
pub struct RequireStaff(pub CurrentUser);

/// Extractor that requires a logged-in super admin.
///
/// Editors get 403 Forbidden.
pub struct RequireSuperAdmin(pub CurrentUser);

/// Rejection of the admin extractors.
#[derive(Debug, PartialEq, Eq)]
pub enum AdminAuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
    /// Logged in, but the role is not sufficient.
    Forbidden,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "Only super admins can access this resource",
            )
                .into_response(),
        }
    }
}

/// Read the staff user from the session.
async fn current_admin(parts: &Parts) -> Result<CurrentUser, AdminAuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AdminAuthRejection::Unauthorized)?;

    session
        .get::<CurrentUser>(CURRENT_ADMIN)
        .await
        .ok()
        .flatten()
        .filter(|user| user.role.is_staff())
        .ok_or_else(|| {
            if parts.uri.path().starts_with("/api/") {
                AdminAuthRejection::Unauthorized
            } else {
                AdminAuthRejection::RedirectToLogin
            }
        })
}

impl<S> FromRequestParts<S> for RequireStaff
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_admin(parts).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireSuperAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = current_admin(parts).await?;
        if admin.role != UserRole::SuperAdmin {
            return Err(AdminAuthRejection::Forbidden);
        }
        Ok(Self(admin))
    }
}

/// Store the logged-in staff user in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(CURRENT_ADMIN, admin).await
}

/// Remove the staff user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<CurrentUser>(CURRENT_ADMIN).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    #[tokio::test]
    async fn test_missing_session_is_unauthorized() {
        let (mut parts, ()) = Request::builder()
            .uri("/faqs")
            .body(())
            .unwrap()
            .into_parts();
        let result = RequireStaff::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AdminAuthRejection::Unauthorized)));
    }

    #[test]
    fn test_rejection_statuses() {
        assert_eq!(
            AdminAuthRejection::RedirectToLogin.into_response().status(),
            StatusCode::SEE_OTHER
        );
        assert_eq!(
            AdminAuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AdminAuthRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
