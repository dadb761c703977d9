//! Types stored in the cookie session.

use serde::{Deserialize, Serialize};

use faqbase_core::{Login, UserId, UserRole};

/// Session-stored user identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub login: Login,
    pub display_name: String,
    pub role: UserRole,
}

impl From<&super::User> for CurrentUser {
    fn from(user: &super::User) -> Self {
        Self {
            id: user.id,
            login: user.login.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
        }
    }
}

/// Session keys.
pub mod keys {
    /// The logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// The visitor session id used by the tracker.
    pub const VISITOR_SID: &str = "visitor_sid";
}
