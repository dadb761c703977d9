//! Search page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use faqbase_core::TrackingAction;
use faqbase_core::search::normalize_term;

use super::{PageContext, Pagination, paginate, track};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{FaqSummary, SearchTermCount};
use crate::services::{SearchService, VisitorContext};
use crate::state::AppState;

/// Maximum number of search hits considered.
const MAX_RESULTS: i64 = 200;

/// Number of popular searches suggested on an empty search.
const POPULAR_SEARCHES: i64 = 10;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<usize>,
}

/// Search results template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/search.html")]
pub struct SearchTemplate {
    pub page: PageContext,
    pub query: String,
    pub results: Vec<FaqSummary>,
    pub total: usize,
    pub popular_searches: Vec<SearchTermCount>,
    pub pagination: Pagination,
    /// Query string prefix that keeps the term on page links.
    pub pagination_query: String,
}

/// Search published FAQs.
///
/// # Errors
///
/// Returns an error if the search query fails.
#[instrument(skip_all, fields(q = %query.q))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    session: Session,
    visitor: VisitorContext,
    OptionalAuth(user): OptionalAuth,
) -> Result<SearchTemplate> {
    let settings = state.settings().load().await?;
    let service = SearchService::new(state.pool());
    let term = normalize_term(&query.q);

    let results = service
        .search(&term, Some(settings.language.as_str()), MAX_RESULTS)
        .await?;
    let total = results.len();
    let (results, pagination) = paginate(results, query.page, settings.records_per_page);
    let popular_searches = if term.is_empty() {
        service.popular_searches(POPULAR_SEARCHES).await?
    } else {
        Vec::new()
    };

    track(
        &state,
        &settings,
        &session,
        &visitor,
        user.as_ref(),
        TrackingAction::Search,
        &term,
    )
    .await;

    Ok(SearchTemplate {
        page: PageContext::new(&settings, user),
        pagination_query: format!("q={}&", urlencoding::encode(&term)),
        query: term,
        results,
        total,
        popular_searches,
        pagination,
    })
}
