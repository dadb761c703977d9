//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;

use faqbase_core::TrackingAction;

use super::{PageContext, track};
use crate::db::{CategoryRepository, FaqRepository, TagRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{Category, FaqSummary, TagCount};
use crate::services::VisitorContext;
use crate::state::AppState;

/// Number of tags in the home page tag cloud.
const TAG_CLOUD_SIZE: i64 = 30;

/// A top-level category on the home page.
pub struct CategoryCard {
    pub category: Category,
    pub records: i64,
    pub subcategories: usize,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub categories: Vec<CategoryCard>,
    pub sticky: Vec<FaqSummary>,
    pub popular: Vec<FaqSummary>,
    pub latest: Vec<FaqSummary>,
    pub tags: Vec<TagCount>,
}

/// Display the home page.
///
/// # Errors
///
/// Returns an error if the settings or listings cannot be loaded.
#[instrument(skip_all)]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    visitor: VisitorContext,
    OptionalAuth(user): OptionalAuth,
) -> Result<HomeTemplate> {
    let settings = state.settings().load().await?;
    let lang = Some(settings.language.as_str());

    let categories = CategoryRepository::new(state.pool());
    let (all, tree) = categories.tree(lang, true).await?;
    let counts = categories.record_counts().await?;
    let cards = all
        .into_iter()
        .filter(|c| c.show_home && tree.roots().iter().any(|root| root.id == c.id))
        .map(|category| CategoryCard {
            records: counts.get(&category.id).copied().unwrap_or_default(),
            subcategories: tree.children(category.id).len(),
            category,
        })
        .collect();

    let faqs = FaqRepository::new(state.pool());
    let sticky = faqs.sticky(lang).await?;
    let popular = faqs.popular(lang, settings.popular_limit).await?;
    let latest = faqs.latest(lang, settings.popular_limit).await?;
    let tags = TagRepository::new(state.pool()).popular(TAG_CLOUD_SIZE).await?;

    track(
        &state,
        &settings,
        &session,
        &visitor,
        user.as_ref(),
        TrackingAction::Home,
        "",
    )
    .await;

    Ok(HomeTemplate {
        page: PageContext::new(&settings, user),
        categories: cards,
        sticky,
        popular,
        latest,
        tags,
    })
}
