//! FAQ record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use faqbase_core::{CategoryId, RecordId};

/// A full FAQ record.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Faq {
    pub id: RecordId,
    pub solution_id: i32,
    pub revision_id: i32,
    pub lang: String,
    pub active: bool,
    pub sticky: bool,
    pub question: String,
    pub answer: String,
    pub keywords: String,
    pub author: String,
    pub email: String,
    pub comments_enabled: bool,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Faq {
    /// Whether `now` lies inside the record's validity window.
    ///
    /// Open ends of the window are unbounded.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_from.is_none_or(|from| from <= now)
            && self.valid_until.is_none_or(|until| now <= until)
    }
}

/// A FAQ as listed on category, tag and home pages.
///
/// `category_id` is the lowest category the record belongs to and is used
/// to build its link.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FaqSummary {
    pub id: RecordId,
    pub solution_id: i32,
    pub category_id: Option<CategoryId>,
    pub lang: String,
    pub question: String,
    pub active: bool,
    pub sticky: bool,
    pub visits: i32,
    pub updated_at: DateTime<Utc>,
}

impl FaqSummary {
    /// Relative link to the FAQ page.
    #[must_use]
    pub fn url(&self) -> String {
        match self.category_id {
            Some(category) => format!("/faq/{category}/{}", self.id),
            None => format!("/solution/{}", self.solution_id),
        }
    }
}

/// Fields accepted when creating or updating a FAQ.
#[derive(Debug, Clone, Deserialize)]
pub struct FaqInput {
    pub lang: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub keywords: String,
    pub author: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub sticky: bool,
    #[serde(default = "default_true")]
    pub comments_enabled: bool,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
    pub categories: Vec<CategoryId>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl FaqInput {
    /// Check the fields every stored record needs.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first missing field.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.question.trim().is_empty() {
            return Err("question is required");
        }
        if self.answer.trim().is_empty() {
            return Err("answer is required");
        }
        if self.categories.is_empty() {
            return Err("at least one category is required");
        }
        Ok(())
    }
}

const fn default_true() -> bool {
    true
}

/// An archived earlier version of a FAQ.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FaqRevision {
    pub record_id: RecordId,
    pub revision_id: i32,
    pub question: String,
    pub answer: String,
    pub keywords: String,
    pub author: String,
    pub archived_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn faq(valid_from: Option<DateTime<Utc>>, valid_until: Option<DateTime<Utc>>) -> Faq {
        let now = Utc::now();
        Faq {
            id: RecordId::new(1),
            solution_id: 1000,
            revision_id: 0,
            lang: "en".to_owned(),
            active: true,
            sticky: false,
            question: "q".to_owned(),
            answer: "a".to_owned(),
            keywords: String::new(),
            author: "x".to_owned(),
            email: String::new(),
            comments_enabled: true,
            valid_from,
            valid_until,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_open_window_is_always_valid() {
        assert!(faq(None, None).is_valid_at(Utc::now()));
    }

    #[test]
    fn test_window_bounds() {
        let now = Utc::now();
        let day = Duration::days(1);
        assert!(faq(Some(now - day), Some(now + day)).is_valid_at(now));
        assert!(!faq(Some(now + day), None).is_valid_at(now));
        assert!(!faq(None, Some(now - day)).is_valid_at(now));
    }

    #[test]
    fn test_summary_url_prefers_category() {
        let summary = FaqSummary {
            id: RecordId::new(5),
            solution_id: 1004,
            category_id: Some(CategoryId::new(2)),
            lang: "en".to_owned(),
            question: "q".to_owned(),
            active: true,
            sticky: false,
            visits: 0,
            updated_at: Utc::now(),
        };
        assert_eq!(summary.url(), "/faq/2/5");
        let orphan = FaqSummary {
            category_id: None,
            ..summary
        };
        assert_eq!(orphan.url(), "/solution/1004");
    }
}
