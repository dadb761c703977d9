//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;
pub mod sessions;

use std::path::PathBuf;

use sqlx::PgPool;
use thiserror::Error;

use faqbase_site::config::{ConfigError, get_database_url};
use faqbase_site::db::{self, RepositoryError};
use faqbase_site::services::AuthError;

/// Errors of the CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("tracking log error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Invalid(String),
}

/// Connect to the site database.
///
/// # Errors
///
/// Returns `CliError::Config` without a database URL, or the connection error.
pub async fn connect() -> Result<PgPool, CliError> {
    let database_url = get_database_url("SITE_DATABASE_URL")?;
    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}

/// Directory of the daily tracking logs.
#[must_use]
pub fn tracking_dir() -> PathBuf {
    std::env::var("SITE_DATA_DIR")
        .map_or_else(|_| PathBuf::from("./data"), PathBuf::from)
        .join("tracking")
}
