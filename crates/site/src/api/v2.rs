//! REST endpoints under `/api/v2`.
//!
//! ```text
//! GET  /version /title /language
//! GET  /categories                 POST /category (token)
//! GET  /faqs /faqs/{category_id} /faqs/tags/{tag_id}
//! GET  /faqs/popular /faqs/latest /faqs/sticky
//! GET  /faq/{category_id}/{faq_id}
//! POST /faq/create (token)         PUT  /faq/update (token)
//! GET  /search?q= /searches/popular /tags /autocomplete?q=
//! POST /login /register
//! ```

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use faqbase_core::{CategoryId, RecordId, TagId};

use super::{ApiCall, ApiToken, list_response};
use crate::db::{CategoryRepository, FaqRepository, TagRepository};
use crate::error::{AppError, Result, set_sentry_user};
use crate::middleware::{api_rate_limiter, auth_rate_limiter, set_current_user};
use crate::models::{CategoryInput, CurrentUser, FaqInput};
use crate::services::auth::{AuthService, Registration};
use crate::services::faq::FaqService;
use crate::services::SearchService;
use crate::state::AppState;

/// Maximum number of search hits returned.
pub const SEARCH_LIMIT: i64 = 100;

/// `?q=` query of search and autocomplete.
#[derive(Debug, Default, Deserialize)]
pub struct TermQuery {
    #[serde(default)]
    pub q: String,
}

/// Body of `PUT /faq/update`.
#[derive(Debug, Deserialize)]
pub struct FaqUpdate {
    pub id: RecordId,
    #[serde(flatten)]
    pub faq: FaqInput,
}

/// Body of `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Answer of the login endpoint.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub logged_in: bool,
    pub user: CurrentUser,
}

/// Answer of write endpoints.
#[derive(Debug, Serialize)]
pub struct Stored<T> {
    pub stored: bool,
    pub id: T,
}

/// Build the `/api/v2` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/version", get(version))
        .route("/title", get(title))
        .route("/language", get(language))
        .route("/categories", get(categories))
        .route("/faqs", get(all_faqs))
        .route("/faqs/{category_id}", get(faqs_by_category))
        .route("/faqs/tags/{tag_id}", get(faqs_by_tag))
        .route("/faqs/popular", get(popular))
        .route("/faqs/latest", get(latest))
        .route("/faqs/sticky", get(sticky))
        .route("/faq/{category_id}/{faq_id}", get(faq))
        .route("/search", get(search))
        .route("/searches/popular", get(popular_searches))
        .route("/tags", get(tags))
        .route("/autocomplete", get(autocomplete))
        .merge(write_routes())
        .merge(account_routes())
}

fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/category", post(create_category))
        .route("/faq/create", post(create_faq))
        .route("/faq/update", put(update_faq))
        .layer(api_rate_limiter())
}

fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .layer(auth_rate_limiter())
}

// =============================================================================
// Site information
// =============================================================================

/// Installed application version.
pub async fn version(State(state): State<AppState>, call: ApiCall) -> Json<&'static str> {
    call.track(&state, "version").await;
    Json(env!("CARGO_PKG_VERSION"))
}

/// Site title.
pub async fn title(State(state): State<AppState>, call: ApiCall) -> Json<String> {
    call.track(&state, "title").await;
    Json(call.settings.title.clone())
}

/// Default language code.
pub async fn language(State(state): State<AppState>, call: ApiCall) -> Json<String> {
    call.track(&state, "language").await;
    Json(call.settings.language.clone())
}

// =============================================================================
// Categories
// =============================================================================

/// Active categories of the site language.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn categories(State(state): State<AppState>, call: ApiCall) -> Result<Response> {
    call.track(&state, "categories").await;
    let categories = CategoryRepository::new(state.pool())
        .list(call.lang(), true)
        .await?;
    Ok(list_response(categories))
}

/// Create a category.
///
/// # Errors
///
/// Returns 400 for a blank name, 404 for a missing parent.
#[instrument(skip_all)]
pub async fn create_category(
    State(state): State<AppState>,
    call: ApiCall,
    _token: ApiToken,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Stored<CategoryId>>)> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("category name is required".to_string()));
    }
    let category = CategoryRepository::new(state.pool()).create(&input).await?;
    call.track(&state, "category").await;
    tracing::info!(category_id = %category.id, "Category created via API");
    Ok((
        StatusCode::CREATED,
        Json(Stored {
            stored: true,
            id: category.id,
        }),
    ))
}

// =============================================================================
// FAQs
// =============================================================================

/// All active FAQs of the site language.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn all_faqs(State(state): State<AppState>, call: ApiCall) -> Result<Response> {
    call.track(&state, "faqs").await;
    let faqs = FaqRepository::new(state.pool())
        .list_all(call.lang(), true)
        .await?;
    Ok(list_response(faqs))
}

/// Active FAQs of one category.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn faqs_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<CategoryId>,
    call: ApiCall,
) -> Result<Response> {
    call.track(&state, &format!("faqs/{category_id}")).await;
    let faqs = FaqRepository::new(state.pool())
        .list_by_category(category_id, true)
        .await?;
    Ok(list_response(faqs))
}

/// Active FAQs carrying a tag.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn faqs_by_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<TagId>,
    call: ApiCall,
) -> Result<Response> {
    call.track(&state, &format!("faqs/tags/{tag_id}")).await;
    let faqs = FaqRepository::new(state.pool()).list_by_tag(tag_id).await?;
    Ok(list_response(faqs))
}

/// Most visited FAQs.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn popular(State(state): State<AppState>, call: ApiCall) -> Result<Response> {
    call.track(&state, "faqs/popular").await;
    let faqs = FaqRepository::new(state.pool())
        .popular(call.lang(), call.settings.popular_limit)
        .await?;
    Ok(list_response(faqs))
}

/// Most recently updated FAQs.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn latest(State(state): State<AppState>, call: ApiCall) -> Result<Response> {
    call.track(&state, "faqs/latest").await;
    let faqs = FaqRepository::new(state.pool())
        .latest(call.lang(), call.settings.popular_limit)
        .await?;
    Ok(list_response(faqs))
}

/// Sticky FAQs.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn sticky(State(state): State<AppState>, call: ApiCall) -> Result<Response> {
    call.track(&state, "faqs/sticky").await;
    let faqs = FaqRepository::new(state.pool()).sticky(call.lang()).await?;
    Ok(list_response(faqs))
}

/// One published FAQ with rendered answer and tags.
///
/// # Errors
///
/// Returns 404 if the FAQ is not published in the category.
pub async fn faq(
    State(state): State<AppState>,
    Path((category_id, faq_id)): Path<(CategoryId, RecordId)>,
    call: ApiCall,
) -> Result<Response> {
    call.track(&state, &format!("faq/{category_id}/{faq_id}")).await;
    let detail = FaqService::new(state.pool())
        .published(faq_id, Some(category_id), call.settings.enable_markdown)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("faq {faq_id}")))?;
    Ok(Json(detail).into_response())
}

fn validate_faq(input: &FaqInput) -> Result<()> {
    input
        .validate()
        .map_err(|reason| AppError::BadRequest(reason.to_string()))
}

/// Create a FAQ.
///
/// # Errors
///
/// Returns 400 for incomplete input.
#[instrument(skip_all)]
pub async fn create_faq(
    State(state): State<AppState>,
    call: ApiCall,
    _token: ApiToken,
    Json(input): Json<FaqInput>,
) -> Result<(StatusCode, Json<Stored<RecordId>>)> {
    validate_faq(&input)?;
    let faq = FaqRepository::new(state.pool()).create(&input).await?;
    call.track(&state, "faq/create").await;
    tracing::info!(record_id = %faq.id, "FAQ created via API");
    Ok((
        StatusCode::CREATED,
        Json(Stored {
            stored: true,
            id: faq.id,
        }),
    ))
}

/// Update a FAQ, archiving its previous revision.
///
/// # Errors
///
/// Returns 400 for incomplete input, 404 for an unknown id.
#[instrument(skip_all, fields(record_id = %update.id))]
pub async fn update_faq(
    State(state): State<AppState>,
    call: ApiCall,
    _token: ApiToken,
    Json(update): Json<FaqUpdate>,
) -> Result<Json<Stored<RecordId>>> {
    validate_faq(&update.faq)?;
    let faq = FaqRepository::new(state.pool())
        .update(update.id, &update.faq)
        .await?;
    call.track(&state, "faq/update").await;
    tracing::info!(revision = faq.revision_id, "FAQ updated via API");
    Ok(Json(Stored {
        stored: true,
        id: faq.id,
    }))
}

// =============================================================================
// Search and tags
// =============================================================================

/// Search published FAQs.
///
/// # Errors
///
/// Returns an error if the search fails.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<TermQuery>,
    call: ApiCall,
) -> Result<Response> {
    call.track(&state, "search").await;
    let results = SearchService::new(state.pool())
        .search(&query.q, call.lang(), SEARCH_LIMIT)
        .await?;
    Ok(list_response(results))
}

/// Most searched terms.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn popular_searches(State(state): State<AppState>, call: ApiCall) -> Result<Response> {
    call.track(&state, "searches/popular").await;
    let terms = SearchService::new(state.pool())
        .popular_searches(call.settings.popular_limit)
        .await?;
    Ok(list_response(terms))
}

/// Tags with their record counts.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn tags(State(state): State<AppState>, call: ApiCall) -> Result<Response> {
    call.track(&state, "tags").await;
    let tags = TagRepository::new(state.pool()).list_with_counts().await?;
    Ok(list_response(tags))
}

/// Questions starting with `q`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn autocomplete(
    State(state): State<AppState>,
    Query(query): Query<TermQuery>,
    call: ApiCall,
) -> Result<Response> {
    call.track(&state, "autocomplete").await;
    let suggestions = SearchService::new(state.pool())
        .autocomplete(&query.q)
        .await?;
    Ok(list_response(suggestions))
}

// =============================================================================
// Accounts
// =============================================================================

/// Log in and store the user in the session.
///
/// # Errors
///
/// Returns 401 for bad credentials, 403 for blocked accounts.
#[instrument(skip_all, fields(login = %body.username))]
pub async fn login(
    State(state): State<AppState>,
    call: ApiCall,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let user = AuthService::new(state.pool())
        .login(&body.username, &body.password)
        .await?;
    let current = CurrentUser::from(&user);
    set_current_user(call.session(), &current)
        .await
        .map_err(|e| AppError::Internal(format!("session: {e}")))?;
    set_sentry_user(&user.id, user.login.as_str());
    call.track(&state, "login").await;

    Ok(Json(LoginResponse {
        logged_in: true,
        user: current,
    }))
}

/// Register an account. The account stays blocked until activated.
///
/// # Errors
///
/// Returns 403 when registration is disabled, 400 for invalid input and
/// 409 for a taken login or email.
#[instrument(skip_all, fields(login = %form.login))]
pub async fn register(
    State(state): State<AppState>,
    call: ApiCall,
    Json(form): Json<Registration>,
) -> Result<(StatusCode, Json<Stored<faqbase_core::UserId>>)> {
    let user = AuthService::new(state.pool())
        .register(call.settings.enable_registration, &form)
        .await?;
    call.track(&state, "register").await;
    Ok((
        StatusCode::CREATED,
        Json(Stored {
            stored: true,
            id: user.id,
        }),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> FaqInput {
        serde_json::from_value(serde_json::json!({
            "lang": "en",
            "question": "How do I reset my password?",
            "answer": "Use the *forgot password* link.",
            "author": "Support",
            "categories": [1],
            "tags": ["account", "password"]
        }))
        .unwrap()
    }

    #[test]
    fn test_faq_input_defaults() {
        let input = input();
        assert!(input.active);
        assert!(!input.sticky);
        assert!(input.keywords.is_empty());
        assert_eq!(input.categories, vec![CategoryId::new(1)]);
    }

    #[test]
    fn test_validate_faq() {
        assert!(validate_faq(&input()).is_ok());

        let mut blank = input();
        blank.question = "   ".to_string();
        assert!(matches!(validate_faq(&blank), Err(AppError::BadRequest(_))));

        let mut orphan = input();
        orphan.categories.clear();
        assert!(matches!(validate_faq(&orphan), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_update_body_flattens_faq_fields() {
        let update: FaqUpdate = serde_json::from_value(serde_json::json!({
            "id": 42,
            "lang": "en",
            "question": "Q",
            "answer": "A",
            "author": "Support",
            "categories": [3]
        }))
        .unwrap();
        assert_eq!(update.id, RecordId::new(42));
        assert_eq!(update.faq.question, "Q");
    }
}
