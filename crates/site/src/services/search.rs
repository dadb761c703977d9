//! Full-text search over published FAQs.

use sqlx::PgPool;

use faqbase_core::search::{like_pattern, normalize_term, prefix_pattern};

use crate::db::{FaqRepository, RepositoryError, SearchLogRepository};
use crate::models::{FaqSummary, SearchTermCount};

/// Maximum number of autocomplete suggestions.
pub const AUTOCOMPLETE_LIMIT: i64 = 10;

/// Search service.
pub struct SearchService<'a> {
    pool: &'a PgPool,
}

impl<'a> SearchService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Search question, answer and keywords. Blank terms return nothing
    /// and are not logged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the search query fails.
    pub async fn search(
        &self,
        term: &str,
        lang: Option<&str>,
        limit: i64,
    ) -> Result<Vec<FaqSummary>, RepositoryError> {
        let term = normalize_term(term);
        if term.is_empty() {
            return Ok(Vec::new());
        }

        if let Err(e) = SearchLogRepository::new(self.pool)
            .log(lang.unwrap_or_default(), &term)
            .await
        {
            tracing::warn!(error = %e, "Failed to log search term");
        }

        FaqRepository::new(self.pool)
            .search(&like_pattern(&term), lang, limit)
            .await
    }

    /// Published questions starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn autocomplete(&self, prefix: &str) -> Result<Vec<FaqSummary>, RepositoryError> {
        let prefix = normalize_term(prefix);
        if prefix.is_empty() {
            return Ok(Vec::new());
        }
        FaqRepository::new(self.pool)
            .questions_starting_with(&prefix_pattern(&prefix), AUTOCOMPLETE_LIMIT)
            .await
    }

    /// Most searched terms.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn popular_searches(
        &self,
        limit: i64,
    ) -> Result<Vec<SearchTermCount>, RepositoryError> {
        SearchLogRepository::new(self.pool).popular(limit).await
    }
}
