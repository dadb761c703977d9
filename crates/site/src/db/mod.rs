//! Database access for the knowledge base.
//!
//! # Schema: `faq`
//!
//! - `category`, `category_record` - Category tree and record membership
//! - `record`, `record_revision`, `record_visit` - FAQ records, history, counters
//! - `tag`, `record_tag` - Tags
//! - `user`, `user_password` - Accounts
//! - `visitor_session`, `search_log` - Visitor statistics
//! - `config` - Runtime settings
//!
//! # Migrations
//!
//! Migrations are stored in `crates/site/migrations/` and run via:
//! ```bash
//! cargo run -p faqbase-cli -- migrate
//! ```

pub mod categories;
pub mod config;
pub mod faqs;
pub mod search_log;
pub mod tags;
pub mod users;
pub mod visitors;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use config::ConfigRepository;
pub use faqs::FaqRepository;
pub use search_log::SearchLogRepository;
pub use tags::TagRepository;
pub use users::UserRepository;
pub use visitors::VisitorRepository;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate login, category still in use).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique-constraint violations to `Conflict` with `message`.
    pub(crate) fn unique(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
