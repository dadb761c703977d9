//! Dashboard route handler.

use askama::Template;
use axum::{
    extract::{Query, State},
    response::Html,
};
use chrono::{DateTime, Utc};
use tracing::instrument;

use faqbase_site::db::{
    CategoryRepository, FaqRepository, SearchLogRepository, TagRepository, UserRepository,
    VisitorRepository,
};

use super::statistics::{VisitBar, visit_bars};
use super::{AdminPage, Flash, render};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireStaff;
use crate::services::{HealthReport, UpdateCheck};
use crate::state::AppState;

/// Days shown in the dashboard visits chart.
const VISIT_DAYS: u32 = 30;

/// Content counters.
#[derive(Debug, Clone, Default)]
pub struct DashboardCounts {
    pub faqs: i64,
    pub published_faqs: i64,
    pub categories: usize,
    pub tags: usize,
    pub users: i64,
    pub searches: i64,
    pub visits: i64,
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: AdminPage,
    pub counts: DashboardCounts,
    pub visits: Vec<VisitBar>,
    pub release_environment: String,
    pub last_checked: Option<DateTime<Utc>>,
    pub update: Option<UpdateCheck>,
    pub health: HealthReport,
}

/// Dashboard page.
///
/// # Errors
///
/// Returns an error if the counters cannot be read.
#[instrument(skip_all)]
pub async fn dashboard(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Query(flash): Query<Flash>,
) -> Result<Html<String>> {
    let settings = state.settings().load().await?;
    let pool = state.pool();

    let daily = VisitorRepository::new(pool).visits_per_day(VISIT_DAYS).await?;
    let counts = DashboardCounts {
        faqs: FaqRepository::new(pool).count(false).await?,
        published_faqs: FaqRepository::new(pool).count(true).await?,
        categories: CategoryRepository::new(pool).list(None, false).await?.len(),
        tags: TagRepository::new(pool).list_with_counts().await?.len(),
        users: UserRepository::new(pool).count().await?,
        searches: SearchLogRepository::new(pool).count().await?,
        visits: daily.iter().map(|d| d.visits).sum(),
    };

    let health = HealthReport::new(&settings, state.tracking().is_writable().await);
    let update = state
        .updates()
        .cached_check(&settings.release_environment)
        .await;

    let template = DashboardTemplate {
        page: AdminPage::new(&admin, "/", flash),
        counts,
        visits: visit_bars(&daily),
        release_environment: settings.release_environment.clone(),
        last_checked: settings.last_checked,
        update,
        health,
    };
    Ok(render(&template))
}
