//! Legacy `api.php?action=` dispatch.
//!
//! Old clients call a single endpoint and pick the operation with the
//! `action` parameter. Each action maps onto the same repositories and
//! services as the REST endpoints.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};

use faqbase_core::{CategoryId, RecordId, TagId};

use super::v2::SEARCH_LIMIT;
use super::{API_VERSION, ApiCall, list_response};
use crate::db::{CategoryRepository, FaqRepository, TagRepository};
use crate::error::{AppError, Result};
use crate::services::SearchService;
use crate::services::faq::FaqService;
use crate::state::AppState;

/// Query parameters of `api.php`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyQuery {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub q: String,
    pub category_id: Option<CategoryId>,
    pub record_id: Option<RecordId>,
    pub tag_id: Option<TagId>,
}

/// Actions understood by `api.php`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyAction {
    GetVersion,
    GetApiVersion,
    GetCount,
    GetDefaultLanguage,
    Search,
    GetPopularSearches,
    GetCategories,
    GetFaqs,
    GetFaq,
    GetFaqsByTag,
    GetTags,
    GetPopular,
    GetLatest,
    GetSticky,
    GetAllFaqs,
}

impl LegacyAction {
    /// Parse an `action` value. Names are case-sensitive.
    #[must_use]
    pub fn parse(action: &str) -> Option<Self> {
        Some(match action {
            "getVersion" => Self::GetVersion,
            "getApiVersion" => Self::GetApiVersion,
            "getCount" => Self::GetCount,
            "getDefaultLanguage" => Self::GetDefaultLanguage,
            "search" => Self::Search,
            "getPopularSearches" => Self::GetPopularSearches,
            "getCategories" => Self::GetCategories,
            "getFaqs" => Self::GetFaqs,
            "getFaq" => Self::GetFaq,
            "getFAQsByTag" => Self::GetFaqsByTag,
            "getTags" => Self::GetTags,
            "getPopular" => Self::GetPopular,
            "getLatest" => Self::GetLatest,
            "getSticky" => Self::GetSticky,
            "getAllFaqs" => Self::GetAllFaqs,
            _ => return None,
        })
    }
}

#[derive(Debug, Serialize)]
struct CountResponse {
    count: i64,
}

/// Build the legacy router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api.php", get(dispatch))
}

fn required<T>(value: Option<T>, name: &str) -> Result<T> {
    value.ok_or_else(|| AppError::BadRequest(format!("missing parameter {name}")))
}

/// Dispatch an `api.php` call.
///
/// # Errors
///
/// Returns 400 for unknown actions or missing parameters.
pub async fn dispatch(
    State(state): State<AppState>,
    Query(query): Query<LegacyQuery>,
    call: ApiCall,
) -> Result<Response> {
    let action = LegacyAction::parse(&query.action)
        .ok_or_else(|| AppError::BadRequest(format!("unknown action '{}'", query.action)))?;
    call.track(&state, &query.action).await;

    let pool = state.pool();
    let lang = call.lang();
    let faqs = FaqRepository::new(pool);

    let response = match action {
        LegacyAction::GetVersion => Json(env!("CARGO_PKG_VERSION")).into_response(),
        LegacyAction::GetApiVersion => Json(API_VERSION).into_response(),
        LegacyAction::GetCount => Json(CountResponse {
            count: faqs.count(true).await?,
        })
        .into_response(),
        LegacyAction::GetDefaultLanguage => Json(call.settings.language.clone()).into_response(),
        LegacyAction::Search => list_response(
            SearchService::new(pool)
                .search(&query.q, lang, SEARCH_LIMIT)
                .await?,
        ),
        LegacyAction::GetPopularSearches => list_response(
            SearchService::new(pool)
                .popular_searches(call.settings.popular_limit)
                .await?,
        ),
        LegacyAction::GetCategories => {
            list_response(CategoryRepository::new(pool).list(lang, true).await?)
        }
        LegacyAction::GetFaqs => list_response(
            faqs.list_by_category(required(query.category_id, "categoryId")?, true)
                .await?,
        ),
        LegacyAction::GetFaq => {
            let id = required(query.record_id, "recordId")?;
            let detail = FaqService::new(pool)
                .published(id, query.category_id, call.settings.enable_markdown)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("faq {id}")))?;
            Json(detail).into_response()
        }
        LegacyAction::GetFaqsByTag => {
            list_response(faqs.list_by_tag(required(query.tag_id, "tagId")?).await?)
        }
        LegacyAction::GetTags => list_response(TagRepository::new(pool).list_with_counts().await?),
        LegacyAction::GetPopular => {
            list_response(faqs.popular(lang, call.settings.popular_limit).await?)
        }
        LegacyAction::GetLatest => {
            list_response(faqs.latest(lang, call.settings.popular_limit).await?)
        }
        LegacyAction::GetSticky => list_response(faqs.sticky(lang).await?),
        LegacyAction::GetAllFaqs => list_response(faqs.list_all(lang, true).await?),
    };

    Ok(response)
}
