//! Authentication service.
//!
//! Password registration and login for site members and staff.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use sqlx::PgPool;

use faqbase_core::{Email, Login, UserRole, UserStatus};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::models::User;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Self-registration form.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub login: String,
    pub display_name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a visitor account.
    ///
    /// New accounts are `blocked` members until an administrator
    /// activates them.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RegistrationDisabled` when `enabled` is false,
    /// a validation error for bad input, or `AuthError::UserAlreadyExists`.
    pub async fn register(&self, enabled: bool, form: &Registration) -> Result<User, AuthError> {
        if !enabled {
            return Err(AuthError::RegistrationDisabled);
        }
        let (login, email) = validate_registration(form)?;
        let display_name = if form.display_name.trim().is_empty() {
            login.as_str()
        } else {
            form.display_name.trim()
        };

        let user = self
            .create_user(
                &NewUser {
                    login: &login,
                    display_name,
                    email: &email,
                    status: UserStatus::Blocked,
                    role: UserRole::Member,
                },
                &form.password,
            )
            .await?;

        tracing::info!(user_id = %user.id, login = %user.login, "User registered");
        Ok(user)
    }

    /// Create an account with a password, bypassing the registration gate.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` or `AuthError::UserAlreadyExists`.
    pub async fn create_user(
        &self,
        user: &NewUser<'_>,
        password: &str,
    ) -> Result<User, AuthError> {
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.users
            .create_with_password(user, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Log in with login name and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the login or password is
    /// wrong, `AuthError::AccountBlocked` if the account may not log in.
    pub async fn login(&self, login: &str, password: &str) -> Result<User, AuthError> {
        let login = Login::parse(login).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&login)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.status.can_login() {
            return Err(AuthError::AccountBlocked);
        }

        self.users.touch_last_login(user.id).await?;
        Ok(user)
    }
}

/// Check a registration form without touching the database.
///
/// # Errors
///
/// Returns the first validation failure.
pub fn validate_registration(form: &Registration) -> Result<(Login, Email), AuthError> {
    let login = Login::parse(&form.login)?;
    let email = Email::parse(&form.email)?;
    validate_password(&form.password)?;
    if form.password != form.password_confirm {
        return Err(AuthError::PasswordMismatch);
    }
    Ok((login, email))
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> Registration {
        Registration {
            login: "jane.doe".to_owned(),
            display_name: "Jane".to_owned(),
            email: "jane@example.org".to_owned(),
            password: "correct horse".to_owned(),
            password_confirm: "correct horse".to_owned(),
        }
    }

    #[test]
    fn test_valid_registration() {
        let (login, email) = validate_registration(&form()).unwrap();
        assert_eq!(login.as_str(), "jane.doe");
        assert_eq!(email.as_str(), "jane@example.org");
    }

    #[test]
    fn test_registration_rejects_bad_login() {
        let mut f = form();
        f.login = "jd".to_owned();
        assert!(matches!(
            validate_registration(&f),
            Err(AuthError::InvalidLogin(_))
        ));
        f.login = "jane doe".to_owned();
        assert!(matches!(
            validate_registration(&f),
            Err(AuthError::InvalidLogin(_))
        ));
    }

    #[test]
    fn test_registration_rejects_short_password() {
        let mut f = form();
        f.password = "short".to_owned();
        f.password_confirm = "short".to_owned();
        assert!(matches!(
            validate_registration(&f),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_registration_rejects_mismatch() {
        let mut f = form();
        f.password_confirm = "correct horse!".to_owned();
        assert!(matches!(
            validate_registration(&f),
            Err(AuthError::PasswordMismatch)
        ));
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("battery staple").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("battery staple", &hash).is_ok());
        assert!(matches!(
            verify_password("battery stapler", &hash),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(verify_password("anything", "not-a-hash").is_err());
    }
}
