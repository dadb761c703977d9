//! Visitor sessions and their tracking lines.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::instrument;

use faqbase_core::SessionId;
use faqbase_site::db::VisitorRepository;
use faqbase_site::models::VisitorSession;
use faqbase_site::services::tracking::{TrackingEntry, retention_cutoff};

use super::{AdminPage, Flash, redirect_error, redirect_notice, render};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireStaff;
use crate::state::AppState;

/// `?day=YYYY-MM-DD` query.
#[derive(Debug, Default, Deserialize)]
pub struct DayQuery {
    pub day: Option<NaiveDate>,
}

/// Sessions of a day.
#[derive(Template)]
#[template(path = "sessions/index.html")]
pub struct SessionsTemplate {
    pub page: AdminPage,
    pub day: NaiveDate,
    pub log_days: Vec<NaiveDate>,
    pub sessions: Vec<VisitorSession>,
}

/// Tracking lines of one session.
#[derive(Template)]
#[template(path = "sessions/show.html")]
pub struct SessionTemplate {
    pub page: AdminPage,
    pub day: NaiveDate,
    pub session: VisitorSession,
    pub entries: Vec<TrackingEntry>,
}

/// Retention form.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub days: u32,
}

/// Sessions started on a day.
///
/// # Errors
///
/// Returns an error if the sessions cannot be read.
#[instrument(skip_all)]
pub async fn index(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<DayQuery>,
    Query(flash): Query<Flash>,
) -> Result<Html<String>> {
    let day = query.day.unwrap_or_else(|| Utc::now().date_naive());
    let sessions = VisitorRepository::new(state.pool()).list_by_day(day).await?;
    let log_days = state.tracking().days().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to list tracking logs");
        Vec::new()
    });

    let template = SessionsTemplate {
        page: AdminPage::new(&admin, "/sessions", flash),
        day,
        log_days,
        sessions,
    };
    Ok(render(&template))
}

/// Tracking lines of one session.
///
/// # Errors
///
/// Returns 404 for an unknown session, or an error if the log cannot be read.
#[instrument(skip(admin, state))]
pub async fn show(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Path(sid): Path<SessionId>,
    Query(query): Query<DayQuery>,
) -> Result<Html<String>> {
    let session = VisitorRepository::new(state.pool())
        .get(sid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("session {sid}")))?;
    let day = query.day.unwrap_or_else(|| session.created_at.date_naive());
    let entries = state
        .tracking()
        .entries_for_session(day, sid)
        .await
        .map_err(|e| AppError::Internal(format!("reading tracking log: {e}")))?;

    let template = SessionTemplate {
        page: AdminPage::new(&admin, "/sessions", Flash::default()),
        day,
        session,
        entries,
    };
    Ok(render(&template))
}

/// Delete sessions and tracking logs older than the given number of days.
///
/// # Errors
///
/// Returns an error if the sessions cannot be deleted.
#[instrument(skip(admin, state))]
pub async fn delete_older(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Form(form): Form<DeleteForm>,
) -> Result<Redirect> {
    if form.days == 0 {
        return Ok(redirect_error("/sessions", "Keep at least one day."));
    }
    let Some(cutoff) = retention_cutoff(Utc::now(), form.days) else {
        return Ok(redirect_error("/sessions", "Retention period is too long."));
    };

    let sessions = VisitorRepository::new(state.pool())
        .delete_before(cutoff)
        .await?;
    let logs = match state.tracking().delete_before(cutoff.date_naive()).await {
        Ok(removed) => removed,
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete tracking logs");
            return Ok(redirect_error(
                "/sessions",
                &format!("Deleted {sessions} sessions, but the tracking logs could not be removed."),
            ));
        }
    };

    tracing::info!(user_id = %admin.id, days = form.days, sessions, logs, "Old sessions deleted");
    Ok(redirect_notice(
        "/sessions",
        &format!("Deleted {sessions} sessions and {logs} log files."),
    ))
}

/// Delete every visitor session.
///
/// # Errors
///
/// Returns an error if the sessions cannot be deleted.
#[instrument(skip_all)]
pub async fn clear(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
) -> Result<Redirect> {
    let deleted = VisitorRepository::new(state.pool()).delete_all().await?;
    tracing::info!(user_id = %admin.id, deleted, "All sessions deleted");
    Ok(redirect_notice(
        "/sessions",
        &format!("Deleted {deleted} sessions."),
    ))
}
