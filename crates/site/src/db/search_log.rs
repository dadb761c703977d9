//! Search log repository.

use sqlx::PgPool;

use super::RepositoryError;
use crate::models::SearchTermCount;

/// Repository for `faq.search_log`.
pub struct SearchLogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SearchLogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a search.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn log(&self, lang: &str, term: &str) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO faq.search_log (lang, term) VALUES ($1, $2)")
            .bind(lang)
            .bind(term)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Most frequent search terms, case-insensitively grouped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn popular(&self, limit: i64) -> Result<Vec<SearchTermCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, SearchTermCount>(
            "SELECT MIN(term) AS term, COUNT(*) AS count
             FROM faq.search_log
             GROUP BY LOWER(term)
             ORDER BY count DESC, term
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM faq.search_log")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM faq.search_log")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
