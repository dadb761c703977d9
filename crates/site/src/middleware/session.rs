//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

/// Session cookie name of the public site.
pub const SESSION_COOKIE_NAME: &str = "faq_session";

/// Session expiry time in seconds (7 days).
pub const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create a session layer with the `PostgreSQL` store.
///
/// The `tower_sessions.session` table is created by `faq-cli migrate`.
/// Cookies are marked secure when `base_url` is HTTPS.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    cookie_name: &'static str,
    base_url: &str,
    expiry_seconds: i64,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());
    let is_secure = base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(cookie_name)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(expiry_seconds),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
