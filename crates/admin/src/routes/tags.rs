//! Tag management.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use faqbase_core::TagId;
use faqbase_core::tags::parse_tag_list;
use faqbase_site::db::{RepositoryError, TagRepository};
use faqbase_site::models::TagCount;

use super::{AdminPage, Flash, redirect_error, redirect_notice, render};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireStaff;
use crate::state::AppState;

/// Tag listing.
#[derive(Template)]
#[template(path = "tags/index.html")]
pub struct TagsTemplate {
    pub page: AdminPage,
    pub tags: Vec<TagCount>,
    pub unused: usize,
}

/// Rename form.
#[derive(Debug, Deserialize)]
pub struct RenameForm {
    pub name: String,
}

/// Clean a submitted tag name. A name with commas is rejected since it
/// would split on the next edit.
fn clean_name(raw: &str) -> Option<String> {
    match parse_tag_list(raw).as_slice() {
        [single] if !raw.contains(',') => Some(single.clone()),
        _ => None,
    }
}

/// Tags with usage counts.
///
/// # Errors
///
/// Returns an error if the tags cannot be read.
#[instrument(skip_all)]
pub async fn index(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Query(flash): Query<Flash>,
) -> Result<Html<String>> {
    let tags = TagRepository::new(state.pool()).list_with_counts().await?;
    let unused = tags.iter().filter(|t| t.count == 0).count();

    Ok(render(&TagsTemplate {
        page: AdminPage::new(&admin, "/tags", flash),
        tags,
        unused,
    }))
}

/// Rename a tag.
///
/// # Errors
///
/// Returns an error if the update fails for a reason other than a
/// duplicate name.
#[instrument(skip(admin, state))]
pub async fn rename(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<TagId>,
    Form(form): Form<RenameForm>,
) -> Result<Redirect> {
    let Some(name) = clean_name(&form.name) else {
        return Ok(redirect_error("/tags", "Tag names cannot be empty or contain commas."));
    };
    match TagRepository::new(state.pool()).rename(id, &name).await {
        Ok(tag) => {
            tracing::info!(user_id = %admin.id, tag_id = %tag.id, "Tag renamed");
            Ok(redirect_notice("/tags", &format!("Renamed tag to {}.", tag.name)))
        }
        Err(RepositoryError::Conflict(_)) => Ok(redirect_error(
            "/tags",
            &format!("A tag named {name} already exists."),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Delete a tag and detach it from its records.
///
/// # Errors
///
/// Returns 404 for an unknown tag.
#[instrument(skip(admin, state))]
pub async fn delete(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<TagId>,
) -> Result<Redirect> {
    TagRepository::new(state.pool()).delete(id).await?;
    tracing::info!(user_id = %admin.id, tag_id = %id, "Tag deleted");
    Ok(redirect_notice("/tags", "Tag deleted."))
}

/// Delete every tag no record uses.
///
/// # Errors
///
/// Returns an error if the tags cannot be deleted.
#[instrument(skip_all)]
pub async fn cleanup(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
) -> Result<Redirect> {
    let deleted = TagRepository::new(state.pool()).delete_unused().await?;
    tracing::info!(user_id = %admin.id, deleted, "Unused tags deleted");
    Ok(redirect_notice("/tags", &format!("Deleted {deleted} unused tags.")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("  two   factor "), Some("two factor".to_string()));
        assert_eq!(clean_name(""), None);
        assert_eq!(clean_name("a, b"), None);
        assert_eq!(clean_name("a,"), None);
    }
}
