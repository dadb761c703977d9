//! FAQ detail route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::Redirect,
};
use tower_sessions::Session;
use tracing::instrument;

use faqbase_core::{CategoryId, RecordId, TrackingAction};

use super::category::{CategoryLink, breadcrumb};
use super::{PageContext, track};
use crate::db::{CategoryRepository, FaqRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::faq::{FaqDetail, FaqService};
use crate::services::VisitorContext;
use crate::state::AppState;

/// FAQ page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/faq.html")]
pub struct FaqTemplate {
    pub page: PageContext,
    pub detail: FaqDetail,
    pub category_id: CategoryId,
    pub breadcrumb: Vec<CategoryLink>,
}

/// Display a FAQ and count the visit.
///
/// # Errors
///
/// Returns 404 if the FAQ is missing, inactive, outside its validity
/// window or not in the category of the URL.
#[instrument(skip(state, session, visitor, user))]
pub async fn show(
    State(state): State<AppState>,
    Path((category_id, id)): Path<(CategoryId, RecordId)>,
    session: Session,
    visitor: VisitorContext,
    OptionalAuth(user): OptionalAuth,
) -> Result<FaqTemplate> {
    let settings = state.settings().load().await?;
    let service = FaqService::new(state.pool());

    let detail = service
        .published(id, Some(category_id), settings.enable_markdown)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("faq {id}")))?;

    let (_, tree) = CategoryRepository::new(state.pool())
        .tree(None, true)
        .await?;

    service.record_visit(id).await;
    track(
        &state,
        &settings,
        &session,
        &visitor,
        user.as_ref(),
        TrackingAction::FaqShow,
        &id.to_string(),
    )
    .await;

    Ok(FaqTemplate {
        page: PageContext::new(&settings, user),
        breadcrumb: breadcrumb(&tree, category_id),
        category_id,
        detail,
    })
}

/// Redirect a solution id to its FAQ page.
///
/// # Errors
///
/// Returns 404 if no active FAQ has the solution id.
#[instrument(skip(state))]
pub async fn solution(
    State(state): State<AppState>,
    Path(solution_id): Path<i32>,
) -> Result<Redirect> {
    let faqs = FaqRepository::new(state.pool());
    let faq = faqs
        .get_by_solution_id(solution_id)
        .await?
        .filter(|faq| faq.active)
        .ok_or_else(|| AppError::NotFound(format!("solution {solution_id}")))?;

    let category = faqs
        .categories_of(faq.id)
        .await?
        .into_iter()
        .min()
        .ok_or_else(|| AppError::NotFound(format!("solution {solution_id}")))?;

    Ok(Redirect::permanent(&format!("/faq/{category}/{}", faq.id)))
}
