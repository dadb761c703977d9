//! Tag repository.

use sqlx::{PgConnection, PgPool};

use faqbase_core::{RecordId, TagId};

use super::RepositoryError;
use crate::models::{Tag, TagCount};

/// Repository for `faq.tag` and `faq.record_tag`.
pub struct TagRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TagRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: TagId) -> Result<Option<Tag>, RepositoryError> {
        let row = sqlx::query_as::<_, Tag>("SELECT id, name FROM faq.tag WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// All tags with the number of records carrying them, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_with_counts(&self) -> Result<Vec<TagCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, TagCount>(
            "SELECT t.id, t.name, COUNT(rt.record_id) AS count
             FROM faq.tag t
             LEFT JOIN faq.record_tag rt ON rt.tag_id = t.id
             GROUP BY t.id, t.name
             ORDER BY LOWER(t.name)",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// The most used tags.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn popular(&self, limit: i64) -> Result<Vec<TagCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, TagCount>(
            "SELECT t.id, t.name, COUNT(*) AS count
             FROM faq.tag t
             JOIN faq.record_tag rt ON rt.tag_id = t.id
             JOIN faq.record r ON r.id = rt.record_id AND r.active
             GROUP BY t.id, t.name
             ORDER BY count DESC, LOWER(t.name)
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Tags of one record, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_record(&self, record: RecordId) -> Result<Vec<Tag>, RepositoryError> {
        let rows = sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.name
             FROM faq.tag t
             JOIN faq.record_tag rt ON rt.tag_id = t.id
             WHERE rt.record_id = $1
             ORDER BY LOWER(t.name)",
        )
        .bind(record)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Replace the tags of a record.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn save_for_record(
        &self,
        record: RecordId,
        names: &[String],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        save_tags_in(&mut tx, record, names).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Rename a tag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if another tag already has the name.
    /// Returns `RepositoryError::NotFound` if the tag does not exist.
    pub async fn rename(&self, id: TagId, name: &str) -> Result<Tag, RepositoryError> {
        sqlx::query_as::<_, Tag>("UPDATE faq.tag SET name = $2 WHERE id = $1 RETURNING id, name")
            .bind(id)
            .bind(name.trim())
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::unique(e, "a tag with this name already exists"))?
            .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the tag does not exist.
    pub async fn delete(&self, id: TagId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM faq.tag WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete tags no record uses. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_unused(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM faq.tag t
             WHERE NOT EXISTS (SELECT 1 FROM faq.record_tag rt WHERE rt.tag_id = t.id)",
        )
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

/// Replace the tags of `record` inside an open transaction.
///
/// Names are matched case-insensitively against existing tags; unknown
/// names create new tags.
pub(crate) async fn save_tags_in(
    conn: &mut PgConnection,
    record: RecordId,
    names: &[String],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM faq.record_tag WHERE record_id = $1")
        .bind(record)
        .execute(&mut *conn)
        .await?;

    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        sqlx::query("INSERT INTO faq.tag (name) VALUES ($1) ON CONFLICT ((LOWER(name))) DO NOTHING")
            .bind(name)
            .execute(&mut *conn)
            .await?;
        let tag: TagId = sqlx::query_scalar("SELECT id FROM faq.tag WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;
        sqlx::query(
            "INSERT INTO faq.record_tag (record_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(record)
        .bind(tag)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
