//! HTTP route handlers for the public FAQ pages.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home: categories, sticky, popular, latest, tag cloud
//! GET  /category/{id}             - Category: breadcrumb, subcategories, FAQs
//! GET  /faq/{category_id}/{id}    - FAQ detail
//! GET  /solution/{solution_id}    - Redirect to the FAQ page
//! GET  /tags/{id}                 - FAQs with a tag
//! GET  /search?q=                 - Search results
//!
//! # Auth
//! GET  /login                     - Login page
//! POST /login                     - Login action (rate limited)
//! GET  /register                  - Registration page
//! POST /register                  - Registration action (rate limited)
//! POST /logout                    - Logout action
//!
//! # Health
//! GET  /health                    - Liveness
//! GET  /health/ready              - Readiness (database)
//! ```

pub mod auth;
pub mod category;
pub mod faq;
pub mod health;
pub mod home;
pub mod search;
pub mod tags;

use axum::{
    Router,
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;

use faqbase_core::TrackingAction;

use crate::middleware::auth_rate_limiter;
use crate::models::CurrentUser;
use crate::services::{VisitorContext, VisitorTracker};
use crate::settings::Settings;
use crate::state::AppState;

/// Layout data shared by every page.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub site_title: String,
    pub lang: String,
    pub user: Option<CurrentUser>,
    pub registration_enabled: bool,
}

impl PageContext {
    #[must_use]
    pub fn new(settings: &Settings, user: Option<CurrentUser>) -> Self {
        Self {
            site_title: settings.title.clone(),
            lang: settings.language.clone(),
            user,
            registration_enabled: settings.enable_registration,
        }
    }
}

/// `?page=` query of paginated listings.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

/// One page of a listing.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: usize,
    pub total_pages: usize,
}

impl Pagination {
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Cut `items` to the requested page. Out-of-range pages clamp to the
/// nearest valid page.
#[must_use]
pub fn paginate<T>(items: Vec<T>, page: Option<usize>, per_page: i64) -> (Vec<T>, Pagination) {
    let per_page = usize::try_from(per_page).unwrap_or(1).max(1);
    let total_pages = items.len().div_ceil(per_page).max(1);
    let page = page.unwrap_or(1).clamp(1, total_pages);
    let items = items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();
    (items, Pagination { page, total_pages })
}

/// Record a page view in the visitor tracker.
pub async fn track(
    state: &AppState,
    settings: &Settings,
    session: &Session,
    visitor: &VisitorContext,
    user: Option<&CurrentUser>,
    action: TrackingAction,
    data: &str,
) {
    VisitorTracker::new(state.pool(), state.tracking())
        .track(
            settings,
            session,
            visitor,
            user.map(|u| u.id),
            action,
            data,
        )
        .await;
}

/// Login and registration submissions, rate limited per client IP.
fn auth_submit_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter())
}

/// Create all page routes of the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/category/{id}", get(category::show))
        .route("/faq/{category_id}/{id}", get(faq::show))
        .route("/solution/{solution_id}", get(faq::solution))
        .route("/tags/{id}", get(tags::show))
        .route("/search", get(search::search))
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .merge(auth_submit_routes())
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_middle_page() {
        let (items, p) = paginate((1..=25).collect::<Vec<_>>(), Some(2), 10);
        assert_eq!(items, (11..=20).collect::<Vec<_>>());
        assert_eq!(p.total_pages, 3);
        assert!(p.has_previous());
        assert!(p.has_next());
    }

    #[test]
    fn test_paginate_clamps_out_of_range() {
        let (items, p) = paginate(vec![1, 2, 3], Some(9), 2);
        assert_eq!(items, vec![3]);
        assert_eq!(p.page, 2);

        let (items, p) = paginate(vec![1, 2, 3], Some(0), 2);
        assert_eq!(items, vec![1, 2]);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn test_paginate_empty_listing_has_one_page() {
        let (items, p) = paginate(Vec::<i32>::new(), None, 10);
        assert!(items.is_empty());
        assert_eq!(p.total_pages, 1);
        assert!(!p.has_next());
    }
}
