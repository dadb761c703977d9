//! Staff account bootstrap.
//!
//! Super admins created here are `protected`: the admin panel cannot
//! block, demote or delete them, so this command is also the way back in
//! after losing access.

use rand::{Rng, distr::Alphanumeric};
use secrecy::{ExposeSecret, SecretString};

use faqbase_core::{Email, Login, UserRole, UserStatus};
use faqbase_site::db::users::NewUser;
use faqbase_site::services::AuthService;

use super::{CliError, connect};

const GENERATED_PASSWORD_LENGTH: usize = 20;

/// Roles that may be created from the command line.
fn parse_staff_role(role: &str) -> Result<UserRole, CliError> {
    let role: UserRole = role.parse().map_err(CliError::Invalid)?;
    if role.is_staff() {
        Ok(role)
    } else {
        Err(CliError::Invalid(format!(
            "role {role} cannot log in to the admin panel, use super_admin or editor"
        )))
    }
}

const fn status_for(role: UserRole) -> UserStatus {
    match role {
        UserRole::SuperAdmin => UserStatus::Protected,
        UserRole::Editor | UserRole::Member => UserStatus::Active,
    }
}

fn generate_password() -> SecretString {
    let password: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect();
    SecretString::from(password)
}

/// Create a staff account.
///
/// The password is read from `FAQ_ADMIN_PASSWORD`; without it a random
/// password is generated and printed once.
///
/// # Errors
///
/// Returns an error for invalid input, a taken login or email, or a
/// database failure.
pub async fn create_user(login: &str, email: &str, name: &str, role: &str) -> Result<(), CliError> {
    let role = parse_staff_role(role)?;
    let login = Login::parse(login).map_err(|e| CliError::Invalid(e.to_string()))?;
    let email = Email::parse(email).map_err(|e| CliError::Invalid(e.to_string()))?;
    let display_name = name.trim();
    if display_name.is_empty() {
        return Err(CliError::Invalid("display name cannot be empty".to_string()));
    }

    let (password, generated) = match std::env::var("FAQ_ADMIN_PASSWORD") {
        Ok(value) if !value.is_empty() => (SecretString::from(value), false),
        _ => (generate_password(), true),
    };

    let pool = connect().await?;
    tracing::info!("Creating {} account: {}", role, login);

    let user = AuthService::new(&pool)
        .create_user(
            &NewUser {
                login: &login,
                display_name,
                email: &email,
                status: status_for(role),
                role,
            },
            password.expose_secret(),
        )
        .await?;

    tracing::info!(user_id = %user.id, status = %user.status, "Account created");

    #[allow(clippy::print_stdout)]
    {
        println!("Created {} account '{}' (id {})", user.role, user.login, user.id);
        if generated {
            println!("Generated password: {}", password.expose_secret());
            println!("Store it now, it is not shown again.");
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_only_staff_roles() {
        assert_eq!(parse_staff_role("super_admin").unwrap(), UserRole::SuperAdmin);
        assert_eq!(parse_staff_role("editor").unwrap(), UserRole::Editor);
        assert!(parse_staff_role("member").is_err());
        assert!(parse_staff_role("root").is_err());
    }

    #[test]
    fn test_super_admins_are_protected() {
        assert_eq!(status_for(UserRole::SuperAdmin), UserStatus::Protected);
        assert_eq!(status_for(UserRole::Editor), UserStatus::Active);
    }

    #[test]
    fn test_generated_password() {
        let first = generate_password();
        let second = generate_password();
        assert_eq!(first.expose_secret().len(), GENERATED_PASSWORD_LENGTH);
        assert!(first.expose_secret().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first.expose_secret(), second.expose_secret());
    }
}
