//! Tag page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use tower_sessions::Session;
use tracing::instrument;

use faqbase_core::{TagId, TrackingAction};

use super::{PageContext, PageQuery, Pagination, paginate, track};
use crate::db::{FaqRepository, TagRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{FaqSummary, Tag};
use crate::services::VisitorContext;
use crate::state::AppState;

/// Tag page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/tag.html")]
pub struct TagTemplate {
    pub page: PageContext,
    pub tag: Tag,
    pub faqs: Vec<FaqSummary>,
    pub pagination: Pagination,
}

/// List the published FAQs carrying a tag.
///
/// # Errors
///
/// Returns 404 if the tag does not exist.
#[instrument(skip(state, session, visitor, user))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<TagId>,
    Query(query): Query<PageQuery>,
    session: Session,
    visitor: VisitorContext,
    OptionalAuth(user): OptionalAuth,
) -> Result<TagTemplate> {
    let settings = state.settings().load().await?;
    let tag = TagRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("tag {id}")))?;

    let faqs = FaqRepository::new(state.pool()).list_by_tag(id).await?;
    let (faqs, pagination) = paginate(faqs, query.page, settings.records_per_page);

    track(
        &state,
        &settings,
        &session,
        &visitor,
        user.as_ref(),
        TrackingAction::Tags,
        &id.to_string(),
    )
    .await;

    Ok(TagTemplate {
        page: PageContext::new(&settings, user),
        tag,
        faqs,
        pagination,
    })
}
