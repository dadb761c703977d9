//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid login name.
    #[error("invalid login: {0}")]
    InvalidLogin(#[from] faqbase_core::LoginError),

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] faqbase_core::EmailError),

    /// Wrong password or unknown login.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but may not log in.
    #[error("account is not active")]
    AccountBlocked,

    /// Login name or email already taken.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Self-registration is switched off.
    #[error("registration is disabled")]
    RegistrationDisabled,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
