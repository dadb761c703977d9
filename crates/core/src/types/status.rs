//! Status and role enums stored on user accounts.

use serde::{Deserialize, Serialize};

/// Account status of a registered user.
///
/// Self-registered users start out `Blocked` until an administrator
/// activates them. `Protected` accounts cannot be blocked or deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "faq.user_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    #[default]
    Blocked,
    Protected,
}

impl UserStatus {
    /// Whether the account may sign in.
    #[must_use]
    pub const fn can_login(self) -> bool {
        matches!(self, Self::Active | Self::Protected)
    }

    /// Whether an administrator may change or delete this account.
    #[must_use]
    pub const fn is_mutable(self) -> bool {
        !matches!(self, Self::Protected)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Blocked => "blocked",
            Self::Protected => "protected",
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "blocked" => Ok(Self::Blocked),
            "protected" => Ok(Self::Protected),
            _ => Err(format!("invalid user status: {s}")),
        }
    }
}

/// Permission level of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "faq.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Full access including users and configuration.
    SuperAdmin,
    /// Manages FAQs, categories, tags and statistics.
    Editor,
    /// Public site account without admin access.
    #[default]
    Member,
}

impl UserRole {
    /// Whether the role may sign in to the admin panel.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Editor)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Editor => "editor",
            Self::Member => "member",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "editor" => Ok(Self::Editor),
            "member" => Ok(Self::Member),
            _ => Err(format!("invalid user role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_users_cannot_login() {
        assert!(UserStatus::Active.can_login());
        assert!(UserStatus::Protected.can_login());
        assert!(!UserStatus::Blocked.can_login());
    }

    #[test]
    fn test_new_accounts_default_to_blocked_members() {
        assert_eq!(UserStatus::default(), UserStatus::Blocked);
        assert_eq!(UserRole::default(), UserRole::Member);
    }

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [UserRole::SuperAdmin, UserRole::Editor, UserRole::Member] {
            assert_eq!(role.to_string().parse::<UserRole>().unwrap(), role);
        }
        assert!("admin".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_only_staff_roles_reach_admin() {
        assert!(UserRole::SuperAdmin.is_staff());
        assert!(UserRole::Editor.is_staff());
        assert!(!UserRole::Member.is_staff());
    }
}
