//! Database migrations.
//!
//! Applies the embedded schema migrations of `crates/site/migrations/`,
//! records the schema version and creates the session table shared by
//! both servers.

use sqlx::PgPool;
use tower_sessions_sqlx_store::PostgresStore;

use faqbase_site::db::{ConfigRepository, MIGRATOR};
use faqbase_site::settings::{APP_VERSION, keys};

use super::{CliError, connect};

/// Run all migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;
    apply(&pool).await?;

    tracing::info!("Running session store migration...");
    PostgresStore::new(pool.clone()).migrate().await?;

    tracing::info!("Migrations complete");
    Ok(())
}

/// Apply the schema migrations and store `main.schemaVersion`.
///
/// # Errors
///
/// Returns an error if a migration or the version write fails.
pub async fn apply(pool: &PgPool) -> Result<(), CliError> {
    tracing::info!("Running schema migrations...");
    MIGRATOR.run(pool).await?;

    ConfigRepository::new(pool)
        .set(keys::SCHEMA_VERSION, APP_VERSION)
        .await?;
    tracing::info!(schema_version = APP_VERSION, "Schema version recorded");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires database (SITE_DATABASE_URL)"]
    async fn test_apply_records_schema_version() {
        let pool = connect().await.unwrap();
        let config = ConfigRepository::new(&pool);
        config.set(keys::SCHEMA_VERSION, "0.0.1").await.unwrap();

        apply(&pool).await.unwrap();

        let stored = config.get(keys::SCHEMA_VERSION).await.unwrap();
        assert_eq!(stored.as_deref(), Some(APP_VERSION));
    }
}
