//! Unified error handling for admin.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use faqbase_site::db::RepositoryError;
use faqbase_site::services::AuthError;
use faqbase_site::settings::SettingsError;

use crate::services::updates::UpdateError;

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// A setting could not be stored.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// The update checker failed.
    #[error("Update check error: {0}")]
    Update(#[from] UpdateError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Settings(SettingsError::Repository(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Settings(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            Self::Auth(AuthError::UserAlreadyExists) => StatusCode::CONFLICT,
            Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Auth(AuthError::AccountBlocked | AuthError::RegistrationDisabled)
            | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Auth(_) => StatusCode::BAD_REQUEST,
            Self::Update(UpdateError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Update(UpdateError::UnknownChannel(_)) => StatusCode::NOT_FOUND,
            Self::Update(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message safe to show to the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.status() {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            StatusCode::BAD_GATEWAY => "Update feed unavailable".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        (status, self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("faq 7".to_string());
        assert_eq!(err.to_string(), "Not found: faq 7");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(get_status(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(get_status(AppError::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(get_status(AppError::BadRequest("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict("in use".into()))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_update_errors() {
        assert_eq!(
            get_status(AppError::Update(UpdateError::NotConfigured)),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AppError::Update(UpdateError::Status(500))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Update(UpdateError::Request("dns failure at 10.1.1.1".into())).public_message(),
            "Update feed unavailable"
        );
    }

    #[test]
    fn test_invalid_setting_is_bad_request() {
        let err: AppError = SettingsError::UnknownKey("main.colour".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
