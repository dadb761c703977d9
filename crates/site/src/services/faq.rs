//! FAQ presentation: answer rendering and the public detail view.

use chrono::Utc;
use comrak::{Options, markdown_to_html};
use serde::Serialize;
use sqlx::PgPool;

use faqbase_core::{CategoryId, RecordId};

use crate::db::{FaqRepository, RepositoryError, TagRepository};
use crate::models::{Faq, Tag};

/// Render an answer for display.
///
/// With markdown enabled the answer is rendered with GitHub-flavored
/// extensions and raw HTML is dropped. Otherwise the text is escaped and
/// line breaks become `<br>`.
#[must_use]
pub fn render_answer(answer: &str, markdown: bool) -> String {
    if !markdown {
        return escape_html(answer).replace("\r\n", "\n").replace('\n', "<br>\n");
    }

    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some("faq-".to_owned());
    options.render.r#unsafe = false;

    markdown_to_html(answer, &options)
}

/// Escape the five HTML-significant characters.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// A published FAQ ready for its page.
#[derive(Debug, Clone, Serialize)]
pub struct FaqDetail {
    pub faq: Faq,
    pub answer_html: String,
    pub tags: Vec<Tag>,
    pub categories: Vec<CategoryId>,
}

/// Loads FAQs for public display.
pub struct FaqService<'a> {
    pool: &'a PgPool,
}

impl<'a> FaqService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load an active FAQ that is inside its validity window.
    ///
    /// When `category` is given the FAQ must belong to it. Inactive,
    /// expired or misplaced FAQs come back as `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn published(
        &self,
        id: RecordId,
        category: Option<CategoryId>,
        markdown: bool,
    ) -> Result<Option<FaqDetail>, RepositoryError> {
        let faqs = FaqRepository::new(self.pool);
        let Some(faq) = faqs.get(id).await? else {
            return Ok(None);
        };
        if !faq.active || !faq.is_valid_at(Utc::now()) {
            return Ok(None);
        }
        let categories = faqs.categories_of(id).await?;
        if category.is_some_and(|c| !categories.contains(&c)) {
            return Ok(None);
        }
        let tags = TagRepository::new(self.pool).for_record(id).await?;

        Ok(Some(FaqDetail {
            answer_html: render_answer(&faq.answer, markdown),
            faq,
            tags,
            categories,
        }))
    }

    /// Count a view of the FAQ. Failures are logged, not returned.
    pub async fn record_visit(&self, id: RecordId) {
        if let Err(e) = FaqRepository::new(self.pool).increment_visits(id).await {
            tracing::warn!(error = %e, record_id = %id, "Failed to count FAQ visit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_escaped_with_breaks() {
        let html = render_answer("Use <b>bold</b> & \"quotes\"\nSecond line", false);
        assert_eq!(
            html,
            "Use &lt;b&gt;bold&lt;/b&gt; &amp; &quot;quotes&quot;<br>\nSecond line"
        );
    }

    #[test]
    fn test_markdown_renders_emphasis_and_tables() {
        let html = render_answer("**Reset** your password\n\n| a | b |\n|---|---|\n| 1 | 2 |", true);
        assert!(html.contains("<strong>Reset</strong>"));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_markdown_drops_raw_html() {
        let html = render_answer("Hello <script>alert(1)</script>", true);
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_escape_html_apostrophe() {
        assert_eq!(escape_html("it's"), "it&#39;s");
    }
}
