//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Health check
//!
//! # Auth (staff accounts only)
//! GET  /login                          - Login page
//! POST /login                          - Login action (rate limited)
//! POST /logout                         - Logout
//!
//! # Content (editors and super admins)
//! GET  /                               - Dashboard
//! GET  /faqs                           - FAQ listing
//! GET  /faqs/new, POST /faqs/new       - Create FAQ
//! GET  /faqs/{id}/edit, POST           - Edit FAQ
//! POST /faqs/{id}/delete               - Delete FAQ
//! POST /faqs/{id}/toggle-active        - Publish / unpublish
//! POST /faqs/{id}/toggle-sticky        - Pin / unpin
//! GET  /faqs/{id}/revisions            - Archived revisions
//! GET  /categories                     - Category tree
//! GET  /categories/new, POST           - Create category
//! GET  /categories/{id}/edit, POST     - Edit category
//! POST /categories/{id}/delete         - Delete category
//! GET  /tags                           - Tags with usage counts
//! POST /tags/{id}/rename               - Rename tag
//! POST /tags/{id}/delete               - Delete tag
//! POST /tags/cleanup                   - Delete unused tags
//!
//! # Statistics
//! GET  /statistics                     - Visits per day, search terms
//! GET  /sessions?day=                  - Visitor sessions of a day
//! GET  /sessions/{sid}?day=            - Tracking lines of a session
//! POST /sessions/delete                - Delete sessions older than N days
//! POST /sessions/clear                 - Delete all sessions
//!
//! # Super admin only
//! GET  /users                          - Accounts
//! POST /users/{id}/status              - Activate / block
//! POST /users/{id}/role                - Change role
//! POST /users/{id}/delete              - Delete account
//! GET  /config, POST /config           - Runtime settings
//! POST /api/updates/maintenance        - Toggle maintenance mode
//!
//! # Updates
//! GET  /updates                        - Update page
//! GET  /api/updates/health-check       - Installation health (JSON)
//! GET  /api/updates/versions           - Installed and published versions (JSON)
//! GET  /api/updates/check              - Compare with the release channel (JSON)
//! ```

pub mod auth;
pub mod categories;
pub mod config;
pub mod dashboard;
pub mod faqs;
pub mod sessions;
pub mod statistics;
pub mod tags;
pub mod updates;
pub mod users;

use askama::Template;
use axum::{
    Router,
    response::{Html, Redirect},
    routing::{get, post},
};
use serde::Deserialize;

use faqbase_core::UserRole;
use faqbase_site::middleware::auth_rate_limiter;
use faqbase_site::models::CurrentUser;

use crate::state::AppState;

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub login: String,
    pub is_super_admin: bool,
}

impl From<&CurrentUser> for AdminUserView {
    fn from(admin: &CurrentUser) -> Self {
        Self {
            name: admin.display_name.clone(),
            login: admin.login.to_string(),
            is_super_admin: admin.role == UserRole::SuperAdmin,
        }
    }
}

/// `?notice=` / `?error=` query set by redirects after a form post.
#[derive(Debug, Default, Deserialize)]
pub struct Flash {
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Layout data shared by every admin page.
#[derive(Debug, Clone)]
pub struct AdminPage {
    pub admin_user: AdminUserView,
    pub current_path: &'static str,
    pub notice: Option<String>,
    pub error: Option<String>,
}

impl AdminPage {
    #[must_use]
    pub fn new(admin: &CurrentUser, current_path: &'static str, flash: Flash) -> Self {
        Self {
            admin_user: AdminUserView::from(admin),
            current_path,
            notice: flash.notice,
            error: flash.error,
        }
    }

    /// Whether the navigation entry for `section` is the current page.
    #[must_use]
    pub fn is_active(&self, section: &str) -> bool {
        if section == "/" {
            self.current_path == "/"
        } else {
            self.current_path.starts_with(section)
        }
    }
}

/// Render a template, logging render failures.
pub fn render<T: Template>(template: &T) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Redirect to `path` with a success message.
#[must_use]
pub fn redirect_notice(path: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{path}?notice={}", urlencoding::encode(message)))
}

/// Redirect to `path` with an error message.
#[must_use]
pub fn redirect_error(path: &str, message: &str) -> Redirect {
    Redirect::to(&format!("{path}?error={}", urlencoding::encode(message)))
}

/// Checkbox value of an HTML form: present means checked.
#[must_use]
pub fn checked(value: Option<&str>) -> bool {
    value.is_some_and(|v| !matches!(v, "" | "false" | "0" | "off"))
}

async fn health() -> &'static str {
    "ok"
}

/// Login submissions, rate limited per client IP.
fn login_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter())
}

/// Create all admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/login", get(auth::login_page))
        .route("/logout", post(auth::logout))
        .merge(login_routes())
        .route("/", get(dashboard::dashboard))
        // FAQs
        .route("/faqs", get(faqs::index))
        .route("/faqs/new", get(faqs::new_page).post(faqs::create))
        .route("/faqs/{id}/edit", get(faqs::edit_page).post(faqs::update))
        .route("/faqs/{id}/delete", post(faqs::delete))
        .route("/faqs/{id}/toggle-active", post(faqs::toggle_active))
        .route("/faqs/{id}/toggle-sticky", post(faqs::toggle_sticky))
        .route("/faqs/{id}/revisions", get(faqs::revisions))
        // Categories
        .route("/categories", get(categories::index))
        .route("/categories/new", get(categories::new_page).post(categories::create))
        .route(
            "/categories/{id}/edit",
            get(categories::edit_page).post(categories::update),
        )
        .route("/categories/{id}/delete", post(categories::delete))
        // Tags
        .route("/tags", get(tags::index))
        .route("/tags/cleanup", post(tags::cleanup))
        .route("/tags/{id}/rename", post(tags::rename))
        .route("/tags/{id}/delete", post(tags::delete))
        // Users
        .route("/users", get(users::index))
        .route("/users/{id}/status", post(users::set_status))
        .route("/users/{id}/role", post(users::set_role))
        .route("/users/{id}/delete", post(users::delete))
        // Statistics
        .route("/statistics", get(statistics::index))
        .route("/sessions", get(sessions::index))
        .route("/sessions/delete", post(sessions::delete_older))
        .route("/sessions/clear", post(sessions::clear))
        .route("/sessions/{sid}", get(sessions::show))
        // Configuration
        .route("/config", get(config::index).post(config::update))
        // Updates
        .route("/updates", get(updates::page))
        .route("/api/updates/health-check", get(updates::health_check))
        .route("/api/updates/versions", get(updates::versions))
        .route("/api/updates/check", get(updates::check))
        .route("/api/updates/maintenance", post(updates::toggle_maintenance))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use faqbase_core::{Login, UserId};

    use super::*;

    fn editor() -> CurrentUser {
        CurrentUser {
            id: UserId::new(2),
            login: Login::parse("editor").unwrap(),
            display_name: "Ed Itor".to_string(),
            role: UserRole::Editor,
        }
    }

    #[test]
    fn test_active_section() {
        let page = AdminPage::new(&editor(), "/faqs", Flash::default());
        assert!(page.is_active("/faqs"));
        assert!(!page.is_active("/"));
        assert!(!page.admin_user.is_super_admin);

        let home = AdminPage::new(&editor(), "/", Flash::default());
        assert!(home.is_active("/"));
    }

    #[test]
    fn test_checkbox_values() {
        assert!(checked(Some("on")));
        assert!(checked(Some("true")));
        assert!(!checked(Some("")));
        assert!(!checked(None));
    }

    #[test]
    fn test_flash_redirects_are_encoded() {
        let response = axum::response::IntoResponse::into_response(redirect_error(
            "/categories",
            "category has FAQs",
        ));
        assert_eq!(
            response.headers().get("location").map(|v| v.to_str().ok()),
            Some(Some("/categories?error=category%20has%20FAQs"))
        );
    }
}
