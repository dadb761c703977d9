//! FAQ editing.
//!
//! The edit form is posted as raw pairs since it repeats `categories`
//! once per checked box.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use faqbase_core::tags::{join_tag_list, parse_tag_list};
use faqbase_core::{CategoryId, LanguageCode, RecordId};
use faqbase_site::db::{CategoryRepository, FaqRepository, RepositoryError, TagRepository};
use faqbase_site::models::{CurrentUser, Faq, FaqInput, FaqRevision, FaqSummary};
use faqbase_site::routes::{Pagination, paginate};

use super::{AdminPage, Flash, checked, redirect_error, redirect_notice, render};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireStaff;
use crate::state::AppState;

const DATETIME_LOCAL: &str = "%Y-%m-%dT%H:%M";

/// `?page=&lang=` of the listing.
#[derive(Debug, Default, Deserialize)]
pub struct FaqListQuery {
    pub page: Option<usize>,
    pub lang: Option<String>,
}

/// FAQ listing.
#[derive(Template)]
#[template(path = "faqs/index.html")]
pub struct FaqsTemplate {
    pub page: AdminPage,
    pub faqs: Vec<FaqSummary>,
    pub pagination: Pagination,
    pub lang: String,
    pub total: usize,
}

/// A category checkbox of the form.
#[derive(Debug, Clone)]
pub struct CategoryChoice {
    pub id: CategoryId,
    pub label: String,
    pub checked: bool,
}

/// Create / edit form.
#[derive(Template)]
#[template(path = "faqs/form.html")]
pub struct FaqFormTemplate {
    pub page: AdminPage,
    pub heading: String,
    pub action: String,
    pub record: Option<RecordId>,
    pub form: FaqForm,
    pub categories: Vec<CategoryChoice>,
    pub form_error: Option<String>,
}

/// Archived revisions.
#[derive(Template)]
#[template(path = "faqs/revisions.html")]
pub struct RevisionsTemplate {
    pub page: AdminPage,
    pub faq: Faq,
    pub revisions: Vec<FaqRevision>,
}

/// Form fields as edited in the browser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaqForm {
    pub lang: String,
    pub question: String,
    pub answer: String,
    pub keywords: String,
    pub author: String,
    pub email: String,
    pub active: bool,
    pub sticky: bool,
    pub comments_enabled: bool,
    pub valid_from: String,
    pub valid_until: String,
    pub tags: String,
    pub categories: Vec<CategoryId>,
}

fn format_local(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|v| v.format(DATETIME_LOCAL).to_string())
        .unwrap_or_default()
}

/// Parse a `datetime-local` input. Seconds are accepted but optional.
fn parse_local(field: &str, raw: &str) -> std::result::Result<Option<DateTime<Utc>>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(raw, DATETIME_LOCAL)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| format!("{field} is not a valid date and time."))
}

impl FaqForm {
    fn blank(lang: &str, author: &str) -> Self {
        Self {
            lang: lang.to_owned(),
            author: author.to_owned(),
            active: true,
            comments_enabled: true,
            ..Self::default()
        }
    }

    fn from_faq(faq: &Faq, categories: Vec<CategoryId>, tags: &[String]) -> Self {
        Self {
            lang: faq.lang.clone(),
            question: faq.question.clone(),
            answer: faq.answer.clone(),
            keywords: faq.keywords.clone(),
            author: faq.author.clone(),
            email: faq.email.clone(),
            active: faq.active,
            sticky: faq.sticky,
            comments_enabled: faq.comments_enabled,
            valid_from: format_local(faq.valid_from),
            valid_until: format_local(faq.valid_until),
            tags: join_tag_list(tags),
            categories,
        }
    }

    /// Collect submitted pairs. Unknown fields are ignored and unchecked
    /// boxes are simply absent.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "lang" => form.lang = value,
                "question" => form.question = value,
                "answer" => form.answer = value,
                "keywords" => form.keywords = value,
                "author" => form.author = value,
                "email" => form.email = value,
                "active" => form.active = checked(Some(&value)),
                "sticky" => form.sticky = checked(Some(&value)),
                "comments_enabled" => form.comments_enabled = checked(Some(&value)),
                "valid_from" => form.valid_from = value,
                "valid_until" => form.valid_until = value,
                "tags" => form.tags = value,
                "categories" => {
                    if let Ok(id) = value.trim().parse::<CategoryId>()
                        && !form.categories.contains(&id)
                    {
                        form.categories.push(id);
                    }
                }
                _ => {}
            }
        }
        form
    }

    /// Validate the form into repository input.
    ///
    /// # Errors
    ///
    /// Returns a message for the first invalid field.
    pub fn to_input(&self) -> std::result::Result<FaqInput, String> {
        let lang = LanguageCode::parse(&self.lang).map_err(|e| e.to_string())?;
        let valid_from = parse_local("Valid from", &self.valid_from)?;
        let valid_until = parse_local("Valid until", &self.valid_until)?;
        if let (Some(from), Some(until)) = (valid_from, valid_until)
            && until < from
        {
            return Err("Valid until lies before valid from.".to_string());
        }
        if self.author.trim().is_empty() {
            return Err("Author is required.".to_string());
        }

        let input = FaqInput {
            lang: lang.to_string(),
            question: self.question.trim().to_owned(),
            answer: self.answer.clone(),
            keywords: self.keywords.trim().to_owned(),
            author: self.author.trim().to_owned(),
            email: self.email.trim().to_owned(),
            active: self.active,
            sticky: self.sticky,
            comments_enabled: self.comments_enabled,
            valid_from,
            valid_until,
            categories: self.categories.clone(),
            tags: parse_tag_list(&self.tags),
        };
        input.validate().map_err(capitalize)?;
        Ok(input)
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        format!("{}{}.", first.to_uppercase(), chars.as_str())
    })
}

async fn load_faq(state: &AppState, id: RecordId) -> Result<Faq> {
    FaqRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("FAQ {id}")))
}

async fn form_page(
    state: &AppState,
    admin: &CurrentUser,
    record: Option<RecordId>,
    form: FaqForm,
    form_error: Option<String>,
) -> Result<Html<String>> {
    let (categories, tree) = CategoryRepository::new(state.pool())
        .tree(None, false)
        .await?;
    let choices = tree
        .flatten()
        .into_iter()
        .filter_map(|flat| {
            let category = categories.iter().find(|c| c.id == flat.node.id)?;
            Some(CategoryChoice {
                id: category.id,
                label: format!(
                    "{}{} ({})",
                    "\u{2014} ".repeat(flat.depth),
                    category.name,
                    category.lang
                ),
                checked: form.categories.contains(&category.id),
            })
        })
        .collect();
    let (heading, action) = record.map_or_else(
        || ("New FAQ".to_string(), "/faqs/new".to_string()),
        |id| (format!("Edit FAQ {id}"), format!("/faqs/{id}/edit")),
    );

    Ok(render(&FaqFormTemplate {
        page: AdminPage::new(admin, "/faqs", Flash::default()),
        heading,
        action,
        record,
        form,
        categories: choices,
        form_error,
    }))
}

/// All FAQs, paginated.
///
/// # Errors
///
/// Returns an error if the records cannot be read.
#[instrument(skip_all)]
pub async fn index(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<FaqListQuery>,
    Query(flash): Query<Flash>,
) -> Result<Html<String>> {
    let settings = state.settings().load().await?;
    let lang = query
        .lang
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(ToOwned::to_owned);
    let all = FaqRepository::new(state.pool())
        .list_all(lang.as_deref(), false)
        .await?;
    let total = all.len();
    let (faqs, pagination) = paginate(all, query.page, settings.records_per_page);

    Ok(render(&FaqsTemplate {
        page: AdminPage::new(&admin, "/faqs", flash),
        faqs,
        pagination,
        lang: lang.unwrap_or_default(),
        total,
    }))
}

/// New FAQ form.
///
/// # Errors
///
/// Returns an error if the settings or categories cannot be read.
#[instrument(skip_all)]
pub async fn new_page(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
) -> Result<Html<String>> {
    let settings = state.settings().load().await?;
    let form = FaqForm::blank(&settings.language, &admin.display_name);
    form_page(&state, &admin, None, form, None).await
}

/// Create a FAQ.
///
/// # Errors
///
/// Returns an error if the record cannot be stored.
#[instrument(skip_all)]
pub async fn create(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let form = FaqForm::from_pairs(pairs);
    let input = match form.to_input() {
        Ok(input) => input,
        Err(message) => {
            return Ok(form_page(&state, &admin, None, form, Some(message))
                .await?
                .into_response());
        }
    };

    match FaqRepository::new(state.pool()).create(&input).await {
        Ok(faq) => {
            tracing::info!(user_id = %admin.id, record_id = %faq.id, "FAQ created");
            Ok(redirect_notice("/faqs", &format!("Created FAQ {}.", faq.id)).into_response())
        }
        Err(RepositoryError::Conflict(message)) => {
            Ok(form_page(&state, &admin, None, form, Some(capitalize(&message)))
                .await?
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Edit form.
///
/// # Errors
///
/// Returns 404 for an unknown record.
#[instrument(skip(admin, state))]
pub async fn edit_page(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Html<String>> {
    let faq = load_faq(&state, id).await?;
    let categories = FaqRepository::new(state.pool()).categories_of(id).await?;
    let tags: Vec<String> = TagRepository::new(state.pool())
        .for_record(id)
        .await?
        .into_iter()
        .map(|t| t.name)
        .collect();
    let form = FaqForm::from_faq(&faq, categories, &tags);
    form_page(&state, &admin, Some(id), form, None).await
}

/// Save a FAQ. The previous content is archived as a revision.
///
/// # Errors
///
/// Returns 404 for an unknown record.
#[instrument(skip(admin, state, pairs))]
pub async fn update(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let form = FaqForm::from_pairs(pairs);
    let input = match form.to_input() {
        Ok(input) => input,
        Err(message) => {
            return Ok(form_page(&state, &admin, Some(id), form, Some(message))
                .await?
                .into_response());
        }
    };

    match FaqRepository::new(state.pool()).update(id, &input).await {
        Ok(faq) => {
            tracing::info!(user_id = %admin.id, record_id = %id, revision = faq.revision_id, "FAQ updated");
            Ok(redirect_notice("/faqs", &format!("Saved FAQ {id}.")).into_response())
        }
        Err(RepositoryError::Conflict(message)) => {
            Ok(form_page(&state, &admin, Some(id), form, Some(capitalize(&message)))
                .await?
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete a FAQ with its revisions.
///
/// # Errors
///
/// Returns 404 for an unknown record.
#[instrument(skip(admin, state))]
pub async fn delete(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Redirect> {
    FaqRepository::new(state.pool()).delete(id).await?;
    tracing::info!(user_id = %admin.id, record_id = %id, "FAQ deleted");
    Ok(redirect_notice("/faqs", &format!("Deleted FAQ {id}.")))
}

/// Publish or unpublish a FAQ.
///
/// # Errors
///
/// Returns 404 for an unknown record.
#[instrument(skip(admin, state))]
pub async fn toggle_active(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Redirect> {
    let faq = load_faq(&state, id).await?;
    let active = !faq.active;
    FaqRepository::new(state.pool()).set_active(id, active).await?;
    tracing::info!(user_id = %admin.id, record_id = %id, active, "FAQ visibility changed");
    let message = if active { "published" } else { "unpublished" };
    Ok(redirect_notice("/faqs", &format!("FAQ {id} {message}.")))
}

/// Pin or unpin a FAQ on the start page.
///
/// # Errors
///
/// Returns 404 for an unknown record.
#[instrument(skip(admin, state))]
pub async fn toggle_sticky(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Redirect> {
    let faq = load_faq(&state, id).await?;
    let sticky = !faq.sticky;
    FaqRepository::new(state.pool()).set_sticky(id, sticky).await?;
    tracing::info!(user_id = %admin.id, record_id = %id, sticky, "FAQ sticky flag changed");
    if sticky {
        Ok(redirect_notice("/faqs", &format!("FAQ {id} is now sticky.")))
    } else {
        Ok(redirect_notice("/faqs", &format!("FAQ {id} is no longer sticky.")))
    }
}

/// Archived revisions of a FAQ.
///
/// # Errors
///
/// Returns 404 for an unknown record.
#[instrument(skip(admin, state))]
pub async fn revisions(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Html<String>> {
    let faq = load_faq(&state, id).await?;
    let revisions = FaqRepository::new(state.pool()).revisions(id).await?;
    if revisions.is_empty() {
        return Err(AppError::NotFound(format!("revisions of FAQ {id}")));
    }

    Ok(render(&RevisionsTemplate {
        page: AdminPage::new(&admin, "/faqs", Flash::default()),
        faq,
        revisions,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn valid() -> Vec<(String, String)> {
        pairs(&[
            ("lang", "en"),
            ("question", " How do I reset my password? "),
            ("answer", "Use the *forgot password* link."),
            ("author", "Ed Itor"),
            ("active", "on"),
            ("categories", "2"),
            ("categories", "5"),
            ("categories", "2"),
            ("tags", "account, Password ,account"),
            ("valid_from", "2026-01-01T08:30"),
        ])
    }

    #[test]
    fn test_from_pairs_collects_repeated_categories() {
        let form = FaqForm::from_pairs(valid());
        assert_eq!(form.categories, vec![CategoryId::new(2), CategoryId::new(5)]);
        assert!(form.active);
        assert!(!form.sticky);
        assert!(!form.comments_enabled);
    }

    #[test]
    fn test_to_input() {
        let input = FaqForm::from_pairs(valid()).to_input().unwrap();
        assert_eq!(input.question, "How do I reset my password?");
        assert_eq!(input.tags, vec!["account".to_string(), "Password".to_string()]);
        assert_eq!(
            input.valid_from,
            Some(Utc.with_ymd_and_hms(2026, 1, 1, 8, 30, 0).unwrap())
        );
        assert_eq!(input.valid_until, None);
    }

    #[test]
    fn test_to_input_requires_a_category() {
        let mut items = valid();
        items.retain(|(k, _)| k != "categories");
        let error = FaqForm::from_pairs(items).to_input().unwrap_err();
        assert_eq!(error, "At least one category is required.");
    }

    #[test]
    fn test_to_input_rejects_reversed_window() {
        let mut items = valid();
        items.push(("valid_until".to_string(), "2025-12-31T00:00".to_string()));
        assert!(FaqForm::from_pairs(items).to_input().is_err());
    }

    #[test]
    fn test_to_input_rejects_bad_date() {
        let mut items = valid();
        items.push(("valid_until".to_string(), "tomorrow".to_string()));
        assert_eq!(
            FaqForm::from_pairs(items).to_input().unwrap_err(),
            "Valid until is not a valid date and time."
        );
    }

    #[test]
    fn test_edit_form_round_trips_dates() {
        let form = FaqForm::from_pairs(valid());
        assert_eq!(form.valid_from, "2026-01-01T08:30");
        let parsed = parse_local("Valid from", &form.valid_from).unwrap();
        assert_eq!(format_local(parsed), form.valid_from);
    }
}
