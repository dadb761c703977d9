//! Visitor statistics.

use askama::Template;
use axum::{
    extract::{Query, State},
    response::Html,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use faqbase_site::db::{SearchLogRepository, VisitorRepository};
use faqbase_site::models::{DailyVisits, SearchTermCount};

use super::{AdminPage, Flash, render};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireStaff;
use crate::state::AppState;

const DEFAULT_DAYS: u32 = 30;
const MAX_DAYS: u32 = 365;
const SEARCH_TERMS: i64 = 25;

/// One row of the visits chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitBar {
    pub day: NaiveDate,
    pub visits: i64,
    /// Share of the busiest day, in percent.
    pub width: i64,
}

/// Scale daily visits against the busiest day.
#[must_use]
pub fn visit_bars(days: &[DailyVisits]) -> Vec<VisitBar> {
    let max = days.iter().map(|d| d.visits).max().unwrap_or(0);
    days.iter()
        .map(|d| VisitBar {
            day: d.day,
            visits: d.visits,
            width: if max > 0 { d.visits.clamp(0, max) * 100 / max } else { 0 },
        })
        .collect()
}

/// `?days=` query.
#[derive(Debug, Default, Deserialize)]
pub struct StatisticsQuery {
    pub days: Option<u32>,
}

/// Statistics page template.
#[derive(Template)]
#[template(path = "statistics.html")]
pub struct StatisticsTemplate {
    pub page: AdminPage,
    pub days: u32,
    pub total_visits: i64,
    pub visits: Vec<VisitBar>,
    pub total_searches: i64,
    pub search_terms: Vec<SearchTermCount>,
}

/// Statistics page.
///
/// # Errors
///
/// Returns an error if the statistics cannot be read.
#[instrument(skip_all)]
pub async fn index(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<StatisticsQuery>,
    Query(flash): Query<Flash>,
) -> Result<Html<String>> {
    let days = query.days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS);
    let daily = VisitorRepository::new(state.pool()).visits_per_day(days).await?;
    let searches = SearchLogRepository::new(state.pool());

    let template = StatisticsTemplate {
        page: AdminPage::new(&admin, "/statistics", flash),
        days,
        total_visits: daily.iter().map(|d| d.visits).sum(),
        visits: visit_bars(&daily),
        total_searches: searches.count().await?,
        search_terms: searches.popular(SEARCH_TERMS).await?,
    };
    Ok(render(&template))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32, visits: i64) -> DailyVisits {
        DailyVisits {
            day: NaiveDate::from_ymd_opt(2026, 3, d).unwrap_or_default(),
            visits,
        }
    }

    #[test]
    fn test_bars_scale_to_busiest_day() {
        let bars = visit_bars(&[day(1, 5), day(2, 20), day(3, 0)]);
        let widths: Vec<i64> = bars.iter().map(|b| b.width).collect();
        assert_eq!(widths, vec![25, 100, 0]);
    }

    #[test]
    fn test_no_visits() {
        assert!(visit_bars(&[]).is_empty());
        assert_eq!(visit_bars(&[day(1, 0)]).first().map(|b| b.width), Some(0));
    }
}
