//! Admin login and logout.
//!
//! Passwords are checked by the site's `AuthService`; only accounts with
//! a staff role may open an admin session.

use askama::Template;
use axum::{
    Form,
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use faqbase_site::error::{clear_sentry_user, set_sentry_user};
use faqbase_site::models::CurrentUser;
use faqbase_site::services::{AuthError, AuthService};

use super::render;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{clear_current_admin, set_current_admin};
use crate::state::AppState;

/// Login form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub login: String,
    pub password: String,
}

/// `?error=` code after a failed login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<&'static str>,
}

/// Message for a login error code.
fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Invalid login or password.",
        "blocked" => "This account is blocked.",
        "staff" => "This account has no access to the administration.",
        "session" => "Your session could not be started. Please try again.",
        _ => "Login failed.",
    }
}

/// Login page.
pub async fn login_page(Query(query): Query<LoginQuery>) -> Html<String> {
    render(&LoginTemplate {
        error: query.error.as_deref().map(error_message),
    })
}

/// Login action.
///
/// # Errors
///
/// Returns an error if the account lookup fails.
#[instrument(skip_all, fields(login = %form.login))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let user = match AuthService::new(state.pool())
        .login(&form.login, &form.password)
        .await
    {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Admin login failed");
            return Ok(Redirect::to("/login?error=credentials").into_response());
        }
        Err(AuthError::AccountBlocked) => {
            return Ok(Redirect::to("/login?error=blocked").into_response());
        }
        Err(e) => return Err(AppError::from(e)),
    };

    if !user.role.is_staff() {
        tracing::warn!(user_id = %user.id, "Member tried to log in to admin");
        return Ok(Redirect::to("/login?error=staff").into_response());
    }

    let admin = CurrentUser::from(&user);
    if let Err(e) = set_current_admin(&session, &admin).await {
        tracing::error!(error = %e, "Failed to store admin session");
        return Ok(Redirect::to("/login?error=session").into_response());
    }
    set_sentry_user(&admin.id, admin.login.as_str());
    tracing::info!(user_id = %admin.id, role = %admin.role, "Admin logged in");

    Ok(Redirect::to("/").into_response())
}

/// Logout action.
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = clear_current_admin(&session).await {
        tracing::warn!(error = %e, "Failed to clear admin session");
    }
    clear_sentry_user();
    Redirect::to("/login")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(error_message("staff"), "This account has no access to the administration.");
        assert_eq!(error_message("anything"), "Login failed.");
    }

    #[test]
    fn test_login_page_renders_error() {
        let html = LoginTemplate {
            error: Some(error_message("credentials")),
        }
        .render()
        .unwrap_or_default();
        assert!(html.contains("Invalid login or password."));
        assert!(html.contains("name=\"password\""));
    }
}
