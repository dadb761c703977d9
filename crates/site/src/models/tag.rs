//! Tag types.

use serde::Serialize;

use faqbase_core::TagId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// A tag with the number of records carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TagCount {
    pub id: TagId,
    pub name: String,
    pub count: i64,
}
