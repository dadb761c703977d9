//! Category types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use faqbase_core::CategoryId;
use faqbase_core::category_tree::CategoryNode;

/// A category as stored in `faq.category`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub lang: String,
    pub parent_id: Option<CategoryId>,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub show_home: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// The fields the category tree indexes.
    #[must_use]
    pub fn node(&self) -> CategoryNode {
        CategoryNode {
            id: self.id,
            parent_id: self.parent_id,
            name: self.name.clone(),
            position: self.position,
        }
    }
}

/// Fields accepted when creating or editing a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub lang: String,
    pub parent_id: Option<CategoryId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_true")]
    pub show_home: bool,
    #[serde(default)]
    pub position: i32,
}

const fn default_true() -> bool {
    true
}
