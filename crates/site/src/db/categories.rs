//! Category repository.

use std::collections::HashMap;

use sqlx::PgPool;

use faqbase_core::CategoryId;
use faqbase_core::category_tree::CategoryTree;

use super::RepositoryError;
use crate::models::{Category, CategoryInput};

const CATEGORY_COLUMNS: &str = "id, lang, parent_id, name, description, active, show_home, \
                                position, created_at, updated_at";

/// Repository for `faq.category`.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List categories, optionally restricted to one language and to
    /// active categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        lang: Option<&str>,
        active_only: bool,
    ) -> Result<Vec<Category>, RepositoryError> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM faq.category
             WHERE ($1::text IS NULL OR lang = $1)
               AND (NOT $2 OR active)
             ORDER BY position, name"
        );
        let rows = sqlx::query_as::<_, Category>(&sql)
            .bind(lang)
            .bind(active_only)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Load categories and index them as a tree.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn tree(
        &self,
        lang: Option<&str>,
        active_only: bool,
    ) -> Result<(Vec<Category>, CategoryTree), RepositoryError> {
        let categories = self.list(lang, active_only).await?;
        let tree = CategoryTree::build(categories.iter().map(Category::node));
        Ok((categories, tree))
    }

    /// Get a category by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM faq.category WHERE id = $1");
        let row = sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the parent does not exist.
    /// Returns `RepositoryError::Database` for other failures.
    pub async fn create(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        if let Some(parent) = input.parent_id
            && self.get(parent).await?.is_none()
        {
            return Err(RepositoryError::NotFound);
        }

        let sql = format!(
            "INSERT INTO faq.category (lang, parent_id, name, description, active, show_home, position)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {CATEGORY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Category>(&sql)
            .bind(&input.lang)
            .bind(input.parent_id)
            .bind(input.name.trim())
            .bind(&input.description)
            .bind(input.active)
            .bind(input.show_home)
            .bind(input.position)
            .fetch_one(self.pool)
            .await?;
        Ok(row)
    }

    /// Update a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category or new parent is missing.
    /// Returns `RepositoryError::Conflict` if the new parent is the category
    /// itself or one of its descendants.
    pub async fn update(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        if let Some(parent) = input.parent_id {
            let (categories, tree) = self.tree(None, false).await?;
            if !categories.iter().any(|c| c.id == parent) {
                return Err(RepositoryError::NotFound);
            }
            if parent == id || tree.is_descendant(parent, id) {
                return Err(RepositoryError::Conflict(
                    "a category cannot be moved below itself".to_owned(),
                ));
            }
        }

        let sql = format!(
            "UPDATE faq.category
             SET lang = $2, parent_id = $3, name = $4, description = $5,
                 active = $6, show_home = $7, position = $8, updated_at = NOW()
             WHERE id = $1
             RETURNING {CATEGORY_COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .bind(&input.lang)
            .bind(input.parent_id)
            .bind(input.name.trim())
            .bind(&input.description)
            .bind(input.active)
            .bind(input.show_home)
            .bind(input.position)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete a category that has neither subcategories nor records.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the category is still in use.
    /// Returns `RepositoryError::NotFound` if it does not exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let children: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM faq.category WHERE parent_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if children > 0 {
            return Err(RepositoryError::Conflict(
                "category has subcategories".to_owned(),
            ));
        }

        let records: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM faq.category_record WHERE category_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if records > 0 {
            return Err(RepositoryError::Conflict("category has FAQs".to_owned()));
        }

        let result = sqlx::query("DELETE FROM faq.category WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    /// Number of records filed under a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_records(&self, id: CategoryId) -> Result<i64, RepositoryError> {
        let count =
            sqlx::query_scalar("SELECT COUNT(*) FROM faq.category_record WHERE category_id = $1")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }

    /// Record counts of every category that has records.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn record_counts(&self) -> Result<HashMap<CategoryId, i64>, RepositoryError> {
        let rows: Vec<(CategoryId, i64)> = sqlx::query_as(
            "SELECT category_id, COUNT(*) FROM faq.category_record GROUP BY category_id",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    /// Activate or deactivate a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn set_active(&self, id: CategoryId, active: bool) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE faq.category SET active = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(active)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
