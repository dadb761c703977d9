//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use faqbase_core::{Email, Login, UserId, UserRole, UserStatus};

/// A registered user (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub login: Login,
    pub display_name: String,
    pub email: Email,
    pub status: UserStatus,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}
