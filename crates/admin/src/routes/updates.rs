//! Update page and the `/api/updates/*` JSON endpoints it calls.

use askama::Template;
use axum::{
    Json,
    extract::{Query, State},
    response::Html,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use faqbase_site::settings::{RELEASE_CHANNELS, keys};

use super::{AdminPage, Flash, render};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{RequireStaff, RequireSuperAdmin};
use crate::services::updates::{HealthReport, UpdateCheck, UpdateError, installed_version};
use crate::state::AppState;

/// Update page.
#[derive(Template)]
#[template(path = "updates.html")]
pub struct UpdatesTemplate {
    pub page: AdminPage,
    pub health: HealthReport,
    pub release_environment: String,
    pub last_checked: Option<DateTime<Utc>>,
    pub update: Option<UpdateCheck>,
    pub feed_configured: bool,
}

/// `GET /api/updates/versions` body.
#[derive(Debug, Serialize)]
pub struct VersionsResponse {
    pub installed: String,
    pub available: Option<String>,
    pub release_environment: String,
    pub last_checked: Option<DateTime<Utc>>,
}

/// `?channel=&refresh=` of the check endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct CheckQuery {
    pub channel: Option<String>,
    #[serde(default)]
    pub refresh: bool,
}

/// `POST /api/updates/maintenance` body.
#[derive(Debug, Serialize)]
pub struct MaintenanceResponse {
    pub maintenance_mode: bool,
}

/// The channel to check: the requested one or the configured default.
fn resolve_channel(requested: Option<&str>, configured: &str) -> Result<String> {
    let channel = requested
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(configured);
    if RELEASE_CHANNELS.contains(&channel) {
        Ok(channel.to_owned())
    } else {
        Err(AppError::BadRequest(format!(
            "unknown release channel {channel}, expected one of {}",
            RELEASE_CHANNELS.join(", ")
        )))
    }
}

async fn health_report(state: &AppState) -> Result<HealthReport> {
    let settings = state.settings().load().await?;
    Ok(HealthReport::new(&settings, state.tracking().is_writable().await))
}

/// Update page.
///
/// # Errors
///
/// Returns an error if the settings cannot be read.
#[instrument(skip_all)]
pub async fn page(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Query(flash): Query<Flash>,
) -> Result<Html<String>> {
    let settings = state.settings().load().await?;
    let health = HealthReport::new(&settings, state.tracking().is_writable().await);
    let update = state.updates().cached_check(&settings.release_environment).await;

    Ok(render(&UpdatesTemplate {
        page: AdminPage::new(&admin, "/updates", flash),
        health,
        release_environment: settings.release_environment.clone(),
        last_checked: settings.last_checked,
        update,
        feed_configured: state.updates().is_configured(),
    }))
}

/// Health of the installation.
///
/// # Errors
///
/// Returns an error if the settings cannot be read.
#[instrument(skip_all)]
pub async fn health_check(
    RequireStaff(_admin): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<HealthReport>> {
    Ok(Json(health_report(&state).await?))
}

/// Installed version and the newest release of the configured channel.
///
/// `available` is `null` while no feed is configured.
///
/// # Errors
///
/// Returns an error if the settings cannot be read or the feed fails.
#[instrument(skip_all)]
pub async fn versions(
    RequireStaff(_admin): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<VersionsResponse>> {
    let settings = state.settings().load().await?;
    let available = match state.updates().feed().await {
        Ok(feed) => feed
            .channel(&settings.release_environment)
            .map(ToOwned::to_owned),
        Err(UpdateError::NotConfigured) => None,
        Err(e) => return Err(e.into()),
    };

    Ok(Json(VersionsResponse {
        installed: installed_version()?.to_string(),
        available,
        release_environment: settings.release_environment.clone(),
        last_checked: settings.last_checked,
    }))
}

/// Compare the installed version with a release channel and remember
/// when the check ran.
///
/// # Errors
///
/// Returns 400 for an unknown channel, 503 without a feed, 502 when the
/// feed fails.
#[instrument(skip(admin, state))]
pub async fn check(
    RequireStaff(admin): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<CheckQuery>,
) -> Result<Json<UpdateCheck>> {
    let settings = state.settings().load().await?;
    let channel = resolve_channel(query.channel.as_deref(), &settings.release_environment)?;
    if query.refresh {
        state.updates().refresh().await;
    }

    let result = state.updates().check(&channel).await?;
    state
        .settings()
        .set(keys::LAST_CHECKED, &result.checked_at.to_rfc3339())
        .await?;
    tracing::info!(
        user_id = %admin.id,
        %channel,
        installed = %result.installed,
        available = %result.available,
        "Update check"
    );
    Ok(Json(result))
}

/// Switch maintenance mode on or off.
///
/// # Errors
///
/// Returns an error if the setting cannot be written.
#[instrument(skip_all)]
pub async fn toggle_maintenance(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
) -> Result<Json<MaintenanceResponse>> {
    let settings = state.settings().load().await?;
    let maintenance_mode = !settings.maintenance_mode;
    state
        .settings()
        .set(keys::MAINTENANCE_MODE, &maintenance_mode.to_string())
        .await?;
    tracing::warn!(user_id = %admin.id, maintenance_mode, "Maintenance mode changed");
    Ok(Json(MaintenanceResponse { maintenance_mode }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_channel_defaults_to_configured() {
        assert_eq!(resolve_channel(None, "stable").unwrap(), "stable");
        assert_eq!(resolve_channel(Some(" "), "nightly").unwrap(), "nightly");
        assert_eq!(resolve_channel(Some("development"), "stable").unwrap(), "development");
    }

    #[test]
    fn test_resolve_channel_rejects_unknown() {
        let err = resolve_channel(Some("beta"), "stable").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_versions_without_feed_serializes_null() {
        let body = serde_json::to_value(VersionsResponse {
            installed: "4.0.0".to_string(),
            available: None,
            release_environment: "stable".to_string(),
            last_checked: None,
        })
        .unwrap();
        assert_eq!(body["available"], serde_json::Value::Null);
        assert_eq!(body["release_environment"], "stable");
    }
}
