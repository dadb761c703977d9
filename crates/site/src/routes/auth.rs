//! Login, registration and logout route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use faqbase_core::TrackingAction;

use super::{PageContext, track};
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService, MIN_PASSWORD_LENGTH, Registration};
use crate::services::VisitorContext;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub login: String,
    pub password: String,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub error: Option<&'static str>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
    pub error: Option<&'static str>,
    pub min_password_length: usize,
}

/// Registration success page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register_success.html")]
pub struct RegisterSuccessTemplate {
    pub page: PageContext,
    pub login: String,
}

/// Error code carried in the `?error=` redirect parameter.
fn error_code(err: &AuthError) -> &'static str {
    match err {
        AuthError::InvalidCredentials => "credentials",
        AuthError::AccountBlocked => "blocked",
        AuthError::UserAlreadyExists => "taken",
        AuthError::InvalidLogin(_) => "login",
        AuthError::InvalidEmail(_) => "email",
        AuthError::WeakPassword(_) => "password_too_short",
        AuthError::PasswordMismatch => "password_mismatch",
        AuthError::RegistrationDisabled => "disabled",
        AuthError::Repository(_) | AuthError::PasswordHash => "failed",
    }
}

/// Message shown for an error code.
#[must_use]
pub fn error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Invalid login or password.",
        "blocked" => "Your account has not been activated yet.",
        "taken" => "This login name or email address is already registered.",
        "login" => "Login names are 3 to 64 characters of letters, digits, . _ @ and -.",
        "email" => "Please enter a valid email address.",
        "password_too_short" => "The password is too short.",
        "password_mismatch" => "The passwords do not match.",
        "disabled" => "Registration is currently disabled.",
        "session" => "Your session could not be saved. Please try again.",
        _ => "Something went wrong. Please try again.",
    }
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
///
/// # Errors
///
/// Returns an error if the settings cannot be loaded.
pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    session: Session,
    visitor: VisitorContext,
    OptionalAuth(user): OptionalAuth,
) -> Result<LoginTemplate> {
    let settings = state.settings().load().await?;
    track(&state, &settings, &session, &visitor, user.as_ref(), TrackingAction::Login, "").await;

    Ok(LoginTemplate {
        page: PageContext::new(&settings, user),
        error: query.error.as_deref().map(error_message),
    })
}

/// Handle login form submission.
///
/// # Errors
///
/// Returns an error if the settings cannot be loaded.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    visitor: VisitorContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let settings = state.settings().load().await?;

    let user = match AuthService::new(state.pool())
        .login(&form.login, &form.password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::info!(login = %form.login, error = %e, "Login failed");
            let target = format!("/login?error={}", error_code(&e));
            return Ok(Redirect::to(&target).into_response());
        }
    };

    let current = CurrentUser::from(&user);
    if let Err(e) = set_current_user(&session, &current).await {
        tracing::error!(error = %e, "Failed to store user in session");
        return Ok(Redirect::to("/login?error=session").into_response());
    }
    set_sentry_user(&user.id, user.login.as_str());
    track(
        &state,
        &settings,
        &session,
        &visitor,
        Some(&current),
        TrackingAction::Login,
        user.login.as_str(),
    )
    .await;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Redirect::to("/").into_response())
}

/// Handle logout.
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    visitor: VisitorContext,
    OptionalAuth(user): OptionalAuth,
) -> Redirect {
    if let (Some(current), Ok(settings)) = (user.as_ref(), state.settings().load().await) {
        track(
            &state,
            &settings,
            &session,
            &visitor,
            Some(current),
            TrackingAction::Logout,
            current.login.as_str(),
        )
        .await;
    }
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!(error = %e, "Failed to clear session");
    }
    clear_sentry_user();
    Redirect::to("/")
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
///
/// # Errors
///
/// Returns an error if the settings cannot be loaded.
pub async fn register_page(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    session: Session,
    visitor: VisitorContext,
    OptionalAuth(user): OptionalAuth,
) -> Result<RegisterTemplate> {
    let settings = state.settings().load().await?;
    track(&state, &settings, &session, &visitor, user.as_ref(), TrackingAction::Register, "").await;

    let error = if settings.enable_registration {
        query.error.as_deref().map(error_message)
    } else {
        Some(error_message("disabled"))
    };

    Ok(RegisterTemplate {
        page: PageContext::new(&settings, user),
        error,
        min_password_length: MIN_PASSWORD_LENGTH,
    })
}

/// Handle registration form submission.
///
/// # Errors
///
/// Returns an error if the settings cannot be loaded.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    visitor: VisitorContext,
    Form(form): Form<Registration>,
) -> Result<Response> {
    let settings = state.settings().load().await?;

    match AuthService::new(state.pool())
        .register(settings.enable_registration, &form)
        .await
    {
        Ok(user) => {
            track(
                &state,
                &settings,
                &session,
                &visitor,
                None,
                TrackingAction::Register,
                user.login.as_str(),
            )
            .await;
            Ok(RegisterSuccessTemplate {
                page: PageContext::new(&settings, None),
                login: user.login.to_string(),
            }
            .into_response())
        }
        Err(e) => {
            tracing::info!(login = %form.login, error = %e, "Registration failed");
            let target = format!("/register?error={}", error_code(&e));
            Ok(Redirect::to(&target).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_code_has_a_message() {
        let errors = [
            AuthError::InvalidCredentials,
            AuthError::AccountBlocked,
            AuthError::UserAlreadyExists,
            AuthError::WeakPassword(String::new()),
            AuthError::PasswordMismatch,
            AuthError::RegistrationDisabled,
            AuthError::PasswordHash,
        ];
        let fallback = error_message("unknown");
        for err in &errors {
            let code = error_code(err);
            if code != "failed" {
                assert_ne!(error_message(code), fallback, "no message for {code}");
            }
        }
    }
}
