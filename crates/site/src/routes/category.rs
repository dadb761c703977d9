//! Category page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use faqbase_core::category_tree::{CategoryNode, CategoryTree};
use faqbase_core::{CategoryId, TrackingAction};

use super::{PageContext, PageQuery, Pagination, paginate, track};
use crate::db::{CategoryRepository, FaqRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{Category, FaqSummary};
use crate::services::VisitorContext;
use crate::state::AppState;

/// A link to a category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryLink {
    pub id: CategoryId,
    pub name: String,
}

impl From<&CategoryNode> for CategoryLink {
    fn from(node: &CategoryNode) -> Self {
        Self {
            id: node.id,
            name: node.name.clone(),
        }
    }
}

/// Breadcrumb from the root down to `id`.
#[must_use]
pub fn breadcrumb(tree: &CategoryTree, id: CategoryId) -> Vec<CategoryLink> {
    tree.path(id).into_iter().map(CategoryLink::from).collect()
}

/// Category page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/category.html")]
pub struct CategoryTemplate {
    pub page: PageContext,
    pub category: Category,
    pub breadcrumb: Vec<CategoryLink>,
    pub subcategories: Vec<CategoryLink>,
    pub faqs: Vec<FaqSummary>,
    pub pagination: Pagination,
}

/// Display a category with its subcategories and FAQs.
///
/// # Errors
///
/// Returns 404 if the category does not exist or is inactive.
#[instrument(skip(state, session, visitor, user))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Query(query): Query<PageQuery>,
    session: Session,
    visitor: VisitorContext,
    OptionalAuth(user): OptionalAuth,
) -> Result<CategoryTemplate> {
    let settings = state.settings().load().await?;

    let (categories, tree) = CategoryRepository::new(state.pool())
        .tree(None, true)
        .await?;
    let category = categories
        .into_iter()
        .find(|c| c.id == id)
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;

    let faqs = FaqRepository::new(state.pool())
        .list_by_category(id, true)
        .await?;
    let (faqs, pagination) = paginate(faqs, query.page, settings.records_per_page);

    track(
        &state,
        &settings,
        &session,
        &visitor,
        user.as_ref(),
        TrackingAction::ShowCategory,
        &id.to_string(),
    )
    .await;

    Ok(CategoryTemplate {
        page: PageContext::new(&settings, user),
        breadcrumb: breadcrumb(&tree, id),
        subcategories: tree.children(id).into_iter().map(CategoryLink::from).collect(),
        category,
        faqs,
        pagination,
    })
}
