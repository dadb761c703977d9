//! Category management.

use std::collections::HashMap;

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use faqbase_core::category_tree::CategoryTree;
use faqbase_core::{CategoryId, LanguageCode};
use faqbase_site::db::{CategoryRepository, RepositoryError};
use faqbase_site::models::{Category, CategoryInput};

use super::{AdminPage, Flash, checked, redirect_error, redirect_notice, render};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireStaff;
use crate::state::AppState;

/// A category in the indented tree listing.
#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: CategoryId,
    pub name: String,
    pub indent: String,
    pub lang: String,
    pub active: bool,
    pub show_home: bool,
    pub position: i32,
    pub records: i64,
}

/// A choice of the parent select box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentOption {
    pub id: CategoryId,
    pub label: String,
    pub selected: bool,
}

/// Category listing.
#[derive(Template)]
#[template(path = "categories/index.html")]
pub struct CategoriesTemplate {
    pub page: AdminPage,
    pub rows: Vec<CategoryRow>,
}

/// Create / edit form.
#[derive(Template)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub page: AdminPage,
    pub heading: &'static str,
    pub action: String,
    pub form: CategoryForm,
    pub parents: Vec<ParentOption>,
    pub form_error: Option<String>,
}

/// Submitted category form. Checkboxes are absent when unchecked.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub parent_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub active: Option<String>,
    pub show_home: Option<String>,
    #[serde(default)]
    pub position: String,
}

impl CategoryForm {
    fn blank(lang: &str) -> Self {
        Self {
            lang: lang.to_owned(),
            active: Some("on".to_owned()),
            show_home: Some("on".to_owned()),
            position: "0".to_owned(),
            ..Self::default()
        }
    }

    fn from_category(category: &Category) -> Self {
        Self {
            lang: category.lang.clone(),
            parent_id: category.parent_id.map(|id| id.to_string()).unwrap_or_default(),
            name: category.name.clone(),
            description: category.description.clone(),
            active: category.active.then(|| "on".to_owned()),
            show_home: category.show_home.then(|| "on".to_owned()),
            position: category.position.to_string(),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        checked(self.active.as_deref())
    }

    #[must_use]
    pub fn is_shown_home(&self) -> bool {
        checked(self.show_home.as_deref())
    }

    fn parent(&self) -> Option<CategoryId> {
        self.parent_id.trim().parse().ok()
    }

    /// Validate the form into repository input.
    ///
    /// # Errors
    ///
    /// Returns a message for the first invalid field.
    pub fn to_input(&self) -> std::result::Result<CategoryInput, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name is required.".to_string());
        }
        let lang = LanguageCode::parse(&self.lang).map_err(|e| e.to_string())?;
        let parent_id = match self.parent_id.trim() {
            "" => None,
            raw => Some(
                raw.parse::<CategoryId>()
                    .map_err(|_| "Unknown parent category.".to_string())?,
            ),
        };
        let position = match self.position.trim() {
            "" => 0,
            raw => raw
                .parse::<i32>()
                .map_err(|_| "Position must be a number.".to_string())?,
        };

        Ok(CategoryInput {
            lang: lang.to_string(),
            parent_id,
            name: name.to_owned(),
            description: self.description.trim().to_owned(),
            active: self.is_active(),
            show_home: self.is_shown_home(),
            position,
        })
    }
}

/// Indented tree rows for the listing.
fn tree_rows(
    categories: &[Category],
    tree: &CategoryTree,
    counts: &HashMap<CategoryId, i64>,
) -> Vec<CategoryRow> {
    let by_id: HashMap<CategoryId, &Category> = categories.iter().map(|c| (c.id, c)).collect();
    tree.flatten()
        .into_iter()
        .filter_map(|flat| {
            let category = by_id.get(&flat.node.id)?;
            Some(CategoryRow {
                id: category.id,
                name: category.name.clone(),
                indent: "\u{2014} ".repeat(flat.depth),
                lang: category.lang.clone(),
                active: category.active,
                show_home: category.show_home,
                position: category.position,
                records: counts.get(&category.id).copied().unwrap_or_default(),
            })
        })
        .collect()
}

/// Parent choices. When editing, the category and its descendants are
/// left out so it cannot be moved below itself.
fn parent_options(
    tree: &CategoryTree,
    editing: Option<CategoryId>,
    selected: Option<CategoryId>,
) -> Vec<ParentOption> {
    let excluded: Vec<CategoryId> = editing
        .map(|id| {
            let mut ids = tree.descendants(id);
            ids.push(id);
            ids
        })
        .unwrap_or_default();
    tree.flatten()
        .into_iter()
        .filter(|flat| !excluded.contains(&flat.node.id))
        .map(|flat| ParentOption {
            id: flat.node.id,
            label: format!("{}{}", "\u{2014} ".repeat(flat.depth), flat.node.name),
            selected: selected == Some(flat.node.id),
        })
        .collect()
}

/// Category tree with record counts.
///
/// # Errors
///
/// Returns an error if the categories cannot be read.
#[instrument(skip_all)]
pub async fn index(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Query(flash): Query<Flash>,
) -> Result<Html<String>> {
    let repo = CategoryRepository::new(state.pool());
    let (categories, tree) = repo.tree(None, false).await?;
    let counts = repo.record_counts().await?;

    Ok(render(&CategoriesTemplate {
        page: AdminPage::new(&admin, "/categories", flash),
        rows: tree_rows(&categories, &tree, &counts),
    }))
}

async fn form_page(
    state: &AppState,
    admin: &faqbase_site::models::CurrentUser,
    editing: Option<CategoryId>,
    form: CategoryForm,
    form_error: Option<String>,
) -> Result<Html<String>> {
    let (_, tree) = CategoryRepository::new(state.pool()).tree(None, false).await?;
    let (heading, action) = editing.map_or_else(
        || ("New category", "/categories/new".to_string()),
        |id| ("Edit category", format!("/categories/{id}/edit")),
    );

    Ok(render(&CategoryFormTemplate {
        page: AdminPage::new(admin, "/categories", Flash::default()),
        heading,
        action,
        parents: parent_options(&tree, editing, form.parent()),
        form,
        form_error,
    }))
}

/// New category form.
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
    form_page(&state, &admin, None, CategoryForm::blank(&settings.language), None).await
}

/// Create a category.
///
/// # Errors
///
/// Returns an error if the category cannot be stored.
#[instrument(skip_all)]
pub async fn create(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(message) => {
            return Ok(form_page(&state, &admin, None, form, Some(message))
                .await?
                .into_response());
        }
    };

    match CategoryRepository::new(state.pool()).create(&input).await {
        Ok(category) => {
            tracing::info!(user_id = %admin.id, category_id = %category.id, "Category created");
            Ok(redirect_notice("/categories", &format!("Created {}.", category.name)).into_response())
        }
        Err(RepositoryError::NotFound) => Ok(form_page(
            &state,
            &admin,
            None,
            form,
            Some("Unknown parent category.".to_string()),
        )
        .await?
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Edit form.
///
/// # Errors
///
/// Returns 404 for an unknown category.
#[instrument(skip(admin, state))]
pub async fn edit_page(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Html<String>> {
    let category = CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;
    form_page(&state, &admin, Some(id), CategoryForm::from_category(&category), None).await
}

/// Update a category.
///
/// # Errors
///
/// Returns 404 for an unknown category.
#[instrument(skip(admin, state, form))]
pub async fn update(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(message) => {
            return Ok(form_page(&state, &admin, Some(id), form, Some(message))
                .await?
                .into_response());
        }
    };

    match CategoryRepository::new(state.pool()).update(id, &input).await {
        Ok(category) => {
            tracing::info!(user_id = %admin.id, category_id = %id, "Category updated");
            Ok(redirect_notice("/categories", &format!("Saved {}.", category.name)).into_response())
        }
        Err(RepositoryError::Conflict(message)) => {
            Ok(form_page(&state, &admin, Some(id), form, Some(message))
                .await?
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete a category without subcategories or FAQs.
///
/// # Errors
///
/// Returns 404 for an unknown category.
#[instrument(skip(admin, state))]
pub async fn delete(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Redirect> {
    match CategoryRepository::new(state.pool()).delete(id).await {
        Ok(()) => {
            tracing::info!(user_id = %admin.id, category_id = %id, "Category deleted");
            Ok(redirect_notice("/categories", "Category deleted."))
        }
        Err(RepositoryError::Conflict(message)) => {
            Ok(redirect_error("/categories", &format!("Cannot delete: {message}.")))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use faqbase_core::category_tree::CategoryNode;

    use super::*;

    fn node(id: i32, parent: Option<i32>, name: &str) -> CategoryNode {
        CategoryNode {
            id: CategoryId::new(id),
            parent_id: parent.map(CategoryId::new),
            name: name.to_string(),
            position: 0,
        }
    }

    fn tree() -> CategoryTree {
        CategoryTree::build([
            node(1, None, "Accounts"),
            node(2, Some(1), "Passwords"),
            node(3, Some(2), "Reset"),
            node(4, None, "Billing"),
        ])
    }

    #[test]
    fn test_form_to_input() {
        let form = CategoryForm {
            lang: "en".into(),
            parent_id: "1".into(),
            name: "  Passwords ".into(),
            active: Some("on".into()),
            position: "3".into(),
            ..CategoryForm::default()
        };
        let input = form.to_input().unwrap();
        assert_eq!(input.name, "Passwords");
        assert_eq!(input.parent_id, Some(CategoryId::new(1)));
        assert!(input.active);
        assert!(!input.show_home);
        assert_eq!(input.position, 3);
    }

    #[test]
    fn test_form_rejects_bad_fields() {
        let blank = CategoryForm::blank("en");
        assert_eq!(blank.to_input().unwrap_err(), "Name is required.");

        let bad_position = CategoryForm {
            name: "x".into(),
            position: "first".into(),
            ..CategoryForm::blank("en")
        };
        assert!(bad_position.to_input().is_err());

        let bad_lang = CategoryForm {
            name: "x".into(),
            lang: "english!".into(),
            ..CategoryForm::blank("en")
        };
        assert!(bad_lang.to_input().is_err());
    }

    #[test]
    fn test_parent_options_exclude_own_subtree() {
        let options = parent_options(&tree(), Some(CategoryId::new(2)), Some(CategoryId::new(1)));
        let ids: Vec<i32> = options.iter().map(|o| o.id.as_i32()).collect();
        assert_eq!(ids, vec![1, 4]);
        assert!(options.first().unwrap().selected);
    }

    #[test]
    fn test_parent_options_are_indented() {
        let options = parent_options(&tree(), None, None);
        let reset = options.iter().find(|o| o.id == CategoryId::new(3)).unwrap();
        assert_eq!(reset.label, "\u{2014} \u{2014} Reset");
    }
}
