//! Runtime configuration table.
//!
//! Plain key/value storage. Typing and defaults live in
//! [`crate::settings`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use super::RepositoryError;

/// One stored setting.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Repository for `faq.config`.
pub struct ConfigRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ConfigRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All stored settings, by key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all(&self) -> Result<Vec<ConfigEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, ConfigEntry>(
            "SELECT key, value, updated_at FROM faq.config ORDER BY key",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        let value = sqlx::query_scalar("SELECT value FROM faq.config WHERE key = $1")
            .bind(key)
            .fetch_optional(self.pool)
            .await?;
        Ok(value)
    }

    /// Insert or replace one setting.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        self.set_many(&[(key, value)]).await
    }

    /// Insert or replace several settings atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for (key, value) in entries {
            sqlx::query(
                "INSERT INTO faq.config (key, value) VALUES ($1, $2)
                 ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = NOW()",
            )
            .bind(*key)
            .bind(*value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
