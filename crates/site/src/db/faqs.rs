//! FAQ record repository.

use sqlx::{PgConnection, PgPool};

use faqbase_core::{CategoryId, RecordId, TagId};

use super::RepositoryError;
use super::tags::save_tags_in;
use crate::models::{Faq, FaqInput, FaqRevision, FaqSummary};

const FAQ_COLUMNS: &str = "id, solution_id, revision_id, lang, active, sticky, question, answer, \
                           keywords, author, email, comments_enabled, valid_from, valid_until, \
                           created_at, updated_at";

const SUMMARY_SELECT: &str = "SELECT r.id, r.solution_id,
            (SELECT MIN(cr.category_id) FROM faq.category_record cr WHERE cr.record_id = r.id)
                AS category_id,
            r.lang, r.question, r.active, r.sticky, COALESCE(v.visits, 0) AS visits, r.updated_at
     FROM faq.record r
     LEFT JOIN faq.record_visit v ON v.record_id = r.id";

/// Records that are active and inside their validity window.
const PUBLISHED: &str = "r.active
     AND (r.valid_from IS NULL OR r.valid_from <= NOW())
     AND (r.valid_until IS NULL OR r.valid_until >= NOW())";

/// Repository for `faq.record` and its link tables.
pub struct FaqRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FaqRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a record by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: RecordId) -> Result<Option<Faq>, RepositoryError> {
        let sql = format!("SELECT {FAQ_COLUMNS} FROM faq.record WHERE id = $1");
        let row = sqlx::query_as::<_, Faq>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Get a record by its public solution id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_solution_id(&self, solution_id: i32) -> Result<Option<Faq>, RepositoryError> {
        let sql = format!("SELECT {FAQ_COLUMNS} FROM faq.record WHERE solution_id = $1");
        let row = sqlx::query_as::<_, Faq>(&sql)
            .bind(solution_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Categories a record is filed under.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories_of(&self, id: RecordId) -> Result<Vec<CategoryId>, RepositoryError> {
        let ids = sqlx::query_scalar(
            "SELECT category_id FROM faq.category_record WHERE record_id = $1 ORDER BY category_id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(ids)
    }

    /// Records of one category, sticky ones first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_category(
        &self,
        category: CategoryId,
        published_only: bool,
    ) -> Result<Vec<FaqSummary>, RepositoryError> {
        let sql = format!(
            "{SUMMARY_SELECT}
             JOIN faq.category_record c ON c.record_id = r.id AND c.category_id = $1
             WHERE (NOT $2 OR ({PUBLISHED}))
             ORDER BY r.sticky DESC, r.question"
        );
        let rows = sqlx::query_as::<_, FaqSummary>(&sql)
            .bind(category)
            .bind(published_only)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// All records, optionally restricted to one language.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(
        &self,
        lang: Option<&str>,
        published_only: bool,
    ) -> Result<Vec<FaqSummary>, RepositoryError> {
        let sql = format!(
            "{SUMMARY_SELECT}
             WHERE ($1::text IS NULL OR r.lang = $1)
               AND (NOT $2 OR ({PUBLISHED}))
             ORDER BY r.id"
        );
        let rows = sqlx::query_as::<_, FaqSummary>(&sql)
            .bind(lang)
            .bind(published_only)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Published records carrying a tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_tag(&self, tag: TagId) -> Result<Vec<FaqSummary>, RepositoryError> {
        let sql = format!(
            "{SUMMARY_SELECT}
             JOIN faq.record_tag t ON t.record_id = r.id AND t.tag_id = $1
             WHERE {PUBLISHED}
             ORDER BY r.question"
        );
        let rows = sqlx::query_as::<_, FaqSummary>(&sql)
            .bind(tag)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Most visited published records.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn popular(
        &self,
        lang: Option<&str>,
        limit: i64,
    ) -> Result<Vec<FaqSummary>, RepositoryError> {
        let sql = format!(
            "{SUMMARY_SELECT}
             WHERE {PUBLISHED} AND ($1::text IS NULL OR r.lang = $1) AND COALESCE(v.visits, 0) > 0
             ORDER BY visits DESC, r.id
             LIMIT $2"
        );
        let rows = sqlx::query_as::<_, FaqSummary>(&sql)
            .bind(lang)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Most recently updated published records.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest(
        &self,
        lang: Option<&str>,
        limit: i64,
    ) -> Result<Vec<FaqSummary>, RepositoryError> {
        let sql = format!(
            "{SUMMARY_SELECT}
             WHERE {PUBLISHED} AND ($1::text IS NULL OR r.lang = $1)
             ORDER BY r.updated_at DESC, r.id DESC
             LIMIT $2"
        );
        let rows = sqlx::query_as::<_, FaqSummary>(&sql)
            .bind(lang)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Published sticky records.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sticky(&self, lang: Option<&str>) -> Result<Vec<FaqSummary>, RepositoryError> {
        let sql = format!(
            "{SUMMARY_SELECT}
             WHERE {PUBLISHED} AND r.sticky AND ($1::text IS NULL OR r.lang = $1)
             ORDER BY r.question"
        );
        let rows = sqlx::query_as::<_, FaqSummary>(&sql)
            .bind(lang)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Published records whose question, answer or keywords match a
    /// `LIKE` pattern (see [`faqbase_core::search::like_pattern`]).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(
        &self,
        pattern: &str,
        lang: Option<&str>,
        limit: i64,
    ) -> Result<Vec<FaqSummary>, RepositoryError> {
        let sql = format!(
            "{SUMMARY_SELECT}
             WHERE {PUBLISHED}
               AND ($2::text IS NULL OR r.lang = $2)
               AND (r.question ILIKE $1 OR r.answer ILIKE $1 OR r.keywords ILIKE $1)
             ORDER BY (r.question ILIKE $1) DESC, visits DESC, r.id
             LIMIT $3"
        );
        let rows = sqlx::query_as::<_, FaqSummary>(&sql)
            .bind(pattern)
            .bind(lang)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Published questions starting with a pattern, for autocompletion.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn questions_starting_with(
        &self,
        pattern: &str,
        limit: i64,
    ) -> Result<Vec<FaqSummary>, RepositoryError> {
        let sql = format!(
            "{SUMMARY_SELECT}
             WHERE {PUBLISHED} AND r.question ILIKE $1
             ORDER BY r.question
             LIMIT $2"
        );
        let rows = sqlx::query_as::<_, FaqSummary>(&sql)
            .bind(pattern)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Create a record with its categories and tags in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if no category is given.
    /// Returns `RepositoryError::Database` for other failures.
    pub async fn create(&self, input: &FaqInput) -> Result<Faq, RepositoryError> {
        ensure_categories(input)?;
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO faq.record
                (lang, active, sticky, question, answer, keywords, author, email,
                 comments_enabled, valid_from, valid_until)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {FAQ_COLUMNS}"
        );
        let faq = sqlx::query_as::<_, Faq>(&sql)
            .bind(&input.lang)
            .bind(input.active)
            .bind(input.sticky)
            .bind(input.question.trim())
            .bind(&input.answer)
            .bind(input.keywords.trim())
            .bind(input.author.trim())
            .bind(input.email.trim())
            .bind(input.comments_enabled)
            .bind(input.valid_from)
            .bind(input.valid_until)
            .fetch_one(&mut *tx)
            .await?;

        replace_categories(&mut tx, faq.id, &input.categories).await?;
        save_tags_in(&mut tx, faq.id, &input.tags).await?;

        tx.commit().await?;
        Ok(faq)
    }

    /// Update a record, archiving its previous content as a revision.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record does not exist.
    /// Returns `RepositoryError::Conflict` if no category is given.
    pub async fn update(&self, id: RecordId, input: &FaqInput) -> Result<Faq, RepositoryError> {
        ensure_categories(input)?;
        let mut tx = self.pool.begin().await?;

        let archived = sqlx::query(
            "INSERT INTO faq.record_revision
                (record_id, revision_id, question, answer, keywords, author)
             SELECT id, revision_id, question, answer, keywords, author
             FROM faq.record WHERE id = $1
             ON CONFLICT (record_id, revision_id) DO NOTHING",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if archived.rows_affected() == 0 && !record_exists(&mut tx, id).await? {
            return Err(RepositoryError::NotFound);
        }

        let sql = format!(
            "UPDATE faq.record
             SET lang = $2, active = $3, sticky = $4, question = $5, answer = $6,
                 keywords = $7, author = $8, email = $9, comments_enabled = $10,
                 valid_from = $11, valid_until = $12,
                 revision_id = revision_id + 1, updated_at = NOW()
             WHERE id = $1
             RETURNING {FAQ_COLUMNS}"
        );
        let faq = sqlx::query_as::<_, Faq>(&sql)
            .bind(id)
            .bind(&input.lang)
            .bind(input.active)
            .bind(input.sticky)
            .bind(input.question.trim())
            .bind(&input.answer)
            .bind(input.keywords.trim())
            .bind(input.author.trim())
            .bind(input.email.trim())
            .bind(input.comments_enabled)
            .bind(input.valid_from)
            .bind(input.valid_until)
            .fetch_one(&mut *tx)
            .await?;

        replace_categories(&mut tx, id, &input.categories).await?;
        save_tags_in(&mut tx, id, &input.tags).await?;

        tx.commit().await?;
        Ok(faq)
    }

    /// Delete a record. Links, revisions and counters cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record does not exist.
    pub async fn delete(&self, id: RecordId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM faq.record WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record does not exist.
    pub async fn set_active(&self, id: RecordId, active: bool) -> Result<(), RepositoryError> {
        self.set_flag("active", id, active).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the record does not exist.
    pub async fn set_sticky(&self, id: RecordId, sticky: bool) -> Result<(), RepositoryError> {
        self.set_flag("sticky", id, sticky).await
    }

    async fn set_flag(&self, column: &str, id: RecordId, value: bool) -> Result<(), RepositoryError> {
        let sql = format!("UPDATE faq.record SET {column} = $2, updated_at = NOW() WHERE id = $1");
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(value)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Archived revisions of a record, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn revisions(&self, id: RecordId) -> Result<Vec<FaqRevision>, RepositoryError> {
        let rows = sqlx::query_as::<_, FaqRevision>(
            "SELECT record_id, revision_id, question, answer, keywords, author, archived_at
             FROM faq.record_revision
             WHERE record_id = $1
             ORDER BY revision_id DESC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Number of records, optionally only published ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, published_only: bool) -> Result<i64, RepositoryError> {
        let sql = format!("SELECT COUNT(*) FROM faq.record r WHERE NOT $1 OR ({PUBLISHED})");
        let count = sqlx::query_scalar(&sql)
            .bind(published_only)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Count a page view of a record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn increment_visits(&self, id: RecordId) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO faq.record_visit (record_id, visits, last_visit)
             VALUES ($1, 1, NOW())
             ON CONFLICT (record_id)
             DO UPDATE SET visits = faq.record_visit.visits + 1, last_visit = NOW()",
        )
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}

fn ensure_categories(input: &FaqInput) -> Result<(), RepositoryError> {
    if input.categories.is_empty() {
        return Err(RepositoryError::Conflict(
            "a FAQ needs at least one category".to_owned(),
        ));
    }
    Ok(())
}

async fn record_exists(conn: &mut PgConnection, id: RecordId) -> Result<bool, RepositoryError> {
    let exists = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM faq.record WHERE id = $1)")
        .bind(id)
        .fetch_one(conn)
        .await?;
    Ok(exists)
}

async fn replace_categories(
    conn: &mut PgConnection,
    id: RecordId,
    categories: &[CategoryId],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM faq.category_record WHERE record_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    let raw: Vec<i32> = categories.iter().map(|c| c.as_i32()).collect();
    sqlx::query(
        "INSERT INTO faq.category_record (category_id, record_id)
         SELECT c, $2 FROM UNNEST($1::int4[]) AS c
         ON CONFLICT DO NOTHING",
    )
    .bind(&raw)
    .bind(id)
    .execute(&mut *conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_foreign_key_violation()
        {
            return RepositoryError::NotFound;
        }
        RepositoryError::Database(e)
    })?;
    Ok(())
}
