//! User account management (super admin only).
//!
//! Protected accounts and the admin's own account cannot be changed here;
//! use `faq-cli admin create` to bootstrap or recover access.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use faqbase_core::{UserId, UserRole, UserStatus};
use faqbase_site::db::UserRepository;
use faqbase_site::models::{CurrentUser, User};

use super::{AdminPage, Flash, redirect_error, redirect_notice, render};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireSuperAdmin;
use crate::state::AppState;

/// User listing.
#[derive(Template)]
#[template(path = "users/index.html")]
pub struct UsersTemplate {
    pub page: AdminPage,
    pub users: Vec<User>,
    pub own_id: UserId,
    pub roles: &'static [UserRole],
}

/// Status form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Role form.
#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: String,
}

const ROLES: &[UserRole] = &[UserRole::SuperAdmin, UserRole::Editor, UserRole::Member];

/// Why `admin` may not change `target`, if anything.
fn change_blocked(admin: &CurrentUser, target: &User) -> Option<&'static str> {
    if admin.id == target.id {
        Some("You cannot change your own account here.")
    } else if !target.status.is_mutable() {
        Some("Protected accounts cannot be changed.")
    } else {
        None
    }
}

async fn load_target(state: &AppState, id: UserId) -> Result<User> {
    UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))
}

/// All accounts.
///
/// # Errors
///
/// Returns an error if the accounts cannot be read.
#[instrument(skip_all)]
pub async fn index(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    Query(flash): Query<Flash>,
) -> Result<Html<String>> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(render(&UsersTemplate {
        page: AdminPage::new(&admin, "/users", flash),
        users,
        own_id: admin.id,
        roles: ROLES,
    }))
}

/// Activate or block an account.
///
/// # Errors
///
/// Returns 404 for an unknown account, 400 for an unknown status.
#[instrument(skip(admin, state))]
pub async fn set_status(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let status: UserStatus = form.status.parse().map_err(AppError::BadRequest)?;
    if status == UserStatus::Protected {
        return Err(AppError::BadRequest(
            "accounts can only be protected from the command line".to_string(),
        ));
    }
    let target = load_target(&state, id).await?;
    if let Some(reason) = change_blocked(&admin, &target) {
        return Ok(redirect_error("/users", reason));
    }

    UserRepository::new(state.pool()).set_status(id, status).await?;
    tracing::info!(user_id = %admin.id, target = %id, %status, "User status changed");
    Ok(redirect_notice(
        "/users",
        &format!("{} is now {status}.", target.login),
    ))
}

/// Change an account's role.
///
/// # Errors
///
/// Returns 404 for an unknown account, 400 for an unknown role.
#[instrument(skip(admin, state))]
pub async fn set_role(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Form(form): Form<RoleForm>,
) -> Result<Redirect> {
    let role: UserRole = form.role.parse().map_err(AppError::BadRequest)?;
    let target = load_target(&state, id).await?;
    if let Some(reason) = change_blocked(&admin, &target) {
        return Ok(redirect_error("/users", reason));
    }

    UserRepository::new(state.pool()).set_role(id, role).await?;
    tracing::info!(user_id = %admin.id, target = %id, %role, "User role changed");
    Ok(redirect_notice(
        "/users",
        &format!("{} is now {role}.", target.login),
    ))
}

/// Delete an account.
///
/// # Errors
///
/// Returns 404 for an unknown account.
#[instrument(skip(admin, state))]
pub async fn delete(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Redirect> {
    let target = load_target(&state, id).await?;
    if let Some(reason) = change_blocked(&admin, &target) {
        return Ok(redirect_error("/users", reason));
    }

    UserRepository::new(state.pool()).delete(id).await?;
    tracing::info!(user_id = %admin.id, target = %id, "User deleted");
    Ok(redirect_notice(
        "/users",
        &format!("Deleted {}.", target.login),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use faqbase_core::{Email, Login};

    use super::*;

    fn user(id: i32, status: UserStatus) -> User {
        User {
            id: UserId::new(id),
            login: Login::parse(&format!("user{id}")).unwrap(),
            display_name: format!("User {id}"),
            email: Email::parse(&format!("user{id}@example.org")).unwrap(),
            status,
            role: UserRole::Editor,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login: None,
        }
    }

    fn admin() -> CurrentUser {
        CurrentUser::from(&User {
            role: UserRole::SuperAdmin,
            ..user(1, UserStatus::Protected)
        })
    }

    #[test]
    fn test_cannot_change_self() {
        assert!(change_blocked(&admin(), &user(1, UserStatus::Active)).is_some());
    }

    #[test]
    fn test_protected_accounts_are_immutable() {
        assert_eq!(
            change_blocked(&admin(), &user(2, UserStatus::Protected)),
            Some("Protected accounts cannot be changed.")
        );
        assert!(change_blocked(&admin(), &user(3, UserStatus::Blocked)).is_none());
    }
}
