//! Update checker.
//!
//! Reads the newest published version per release channel from a JSON
//! feed, compares it with the installed version and reports the health
//! of the installation. Downloading and applying updates is left to the
//! operator; schema migrations run through `faq-cli migrate`.
//!
//! The feed looks like:
//!
//! ```json
//! {"stable": "4.0.1", "development": "4.1.0-beta.2", "nightly": "4.1.0-nightly.20260101"}
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use faqbase_core::version::{UpdateStatus, Version, VersionError};
use faqbase_site::settings::{APP_VERSION, Settings};

/// How long a fetched feed is reused.
pub const FEED_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors of the update checker.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// No feed URL is configured.
    #[error("update feed is not configured")]
    NotConfigured,

    /// The feed could not be fetched.
    #[error("update feed request failed: {0}")]
    Request(String),

    /// The feed answered with a non-success status.
    #[error("update feed returned HTTP {0}")]
    Status(u16),

    /// The feed does not list the release channel.
    #[error("no release published for channel {0}")]
    UnknownChannel(String),

    /// A version string could not be parsed.
    #[error(transparent)]
    InvalidVersion(#[from] VersionError),
}

/// Newest published version per release channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionFeed {
    #[serde(default)]
    pub stable: Option<String>,
    #[serde(default)]
    pub development: Option<String>,
    #[serde(default)]
    pub nightly: Option<String>,
}

impl VersionFeed {
    /// Version string published for `channel`.
    #[must_use]
    pub fn channel(&self, channel: &str) -> Option<&str> {
        match channel {
            "stable" => self.stable.as_deref(),
            "development" => self.development.as_deref(),
            "nightly" => self.nightly.as_deref(),
            _ => None,
        }
    }
}

/// Result of an update check.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateCheck {
    pub installed: Version,
    pub available: Version,
    pub channel: String,
    pub status: UpdateStatus,
    pub label: &'static str,
    pub checked_at: DateTime<Utc>,
}

impl UpdateCheck {
    /// Compare `installed` with what `feed` publishes for `channel`.
    ///
    /// # Errors
    ///
    /// Returns `UpdateError::UnknownChannel` if the channel has no release,
    /// `UpdateError::InvalidVersion` if the published version is malformed.
    pub fn evaluate(
        installed: &Version,
        feed: &VersionFeed,
        channel: &str,
        checked_at: DateTime<Utc>,
    ) -> Result<Self, UpdateError> {
        let available = feed
            .channel(channel)
            .ok_or_else(|| UpdateError::UnknownChannel(channel.to_owned()))
            .and_then(|raw| Version::parse(raw).map_err(UpdateError::from))?;
        let status = UpdateStatus::compare(installed, &available);

        Ok(Self {
            installed: installed.clone(),
            available,
            channel: channel.to_owned(),
            status,
            label: status.label(),
            checked_at,
        })
    }
}

/// Installation health as shown before updating.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub installed_version: String,
    pub schema_version: String,
    pub schema_matches: bool,
    pub data_dir_writable: bool,
    pub maintenance_mode: bool,
    pub healthy: bool,
}

impl HealthReport {
    /// Build the report. The installation is healthy when the data
    /// directory is writable and the stored schema version matches the
    /// installed version. A schema version that was never recorded does
    /// not match.
    #[must_use]
    pub fn new(settings: &Settings, data_dir_writable: bool) -> Self {
        let installed_version = installed_version_string();
        let schema_matches = Version::parse(&settings.schema_version)
            .ok()
            .zip(Version::parse(&installed_version).ok())
            .is_some_and(|(schema, installed)| schema == installed);

        Self {
            schema_version: settings.schema_version.clone(),
            installed_version,
            schema_matches,
            data_dir_writable,
            maintenance_mode: settings.maintenance_mode,
            healthy: schema_matches && data_dir_writable,
        }
    }
}

fn installed_version_string() -> String {
    APP_VERSION.to_owned()
}

/// The running version.
///
/// # Errors
///
/// Returns `UpdateError::InvalidVersion` if the package version is not a
/// semantic version.
pub fn installed_version() -> Result<Version, UpdateError> {
    Ok(Version::parse(APP_VERSION)?)
}

/// Fetches and caches the version feed.
#[derive(Clone)]
pub struct UpdateService {
    client: Client,
    feed_url: Option<Url>,
    cache: Cache<(), Arc<VersionFeed>>,
}

impl std::fmt::Debug for UpdateService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateService")
            .field("feed_url", &self.feed_url.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

impl UpdateService {
    #[must_use]
    pub fn new(feed_url: Option<Url>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("faqbase/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                Client::new()
            });

        Self {
            client,
            feed_url,
            cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(FEED_CACHE_TTL)
                .build(),
        }
    }

    /// Whether a feed URL is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.feed_url.is_some()
    }

    /// The version feed, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `UpdateError::NotConfigured` without a feed URL, or a
    /// request error when the feed cannot be fetched.
    pub async fn feed(&self) -> Result<Arc<VersionFeed>, UpdateError> {
        if let Some(feed) = self.cache.get(&()).await {
            return Ok(feed);
        }
        let feed = Arc::new(self.fetch().await?);
        self.cache.insert((), Arc::clone(&feed)).await;
        Ok(feed)
    }

    /// Drop the cached feed so the next call fetches it again.
    pub async fn refresh(&self) {
        self.cache.invalidate(&()).await;
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<VersionFeed, UpdateError> {
        let url = self.feed_url.as_ref().ok_or(UpdateError::NotConfigured)?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| UpdateError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Update feed returned an error");
            return Err(UpdateError::Status(status.as_u16()));
        }

        let feed: VersionFeed = response
            .json()
            .await
            .map_err(|e| UpdateError::Request(e.to_string()))?;
        tracing::debug!(?feed, "Fetched update feed");
        Ok(feed)
    }

    /// The last check result if the feed is still cached. Never fetches.
    pub async fn cached_check(&self, channel: &str) -> Option<UpdateCheck> {
        let feed = self.cache.get(&()).await?;
        let installed = installed_version().ok()?;
        UpdateCheck::evaluate(&installed, &feed, channel, Utc::now()).ok()
    }

    /// Check the installed version against `channel`.
    ///
    /// # Errors
    ///
    /// Returns any feed, channel or version error.
    pub async fn check(&self, channel: &str) -> Result<UpdateCheck, UpdateError> {
        let feed = self.feed().await?;
        UpdateCheck::evaluate(&installed_version()?, &feed, channel, Utc::now())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use axum::{Json, Router, routing::get};

    use super::*;
    use faqbase_site::settings::keys;

    fn feed() -> VersionFeed {
        VersionFeed {
            stable: Some("4.0.1".into()),
            development: Some("4.1.0-beta.2".into()),
            nightly: None,
        }
    }

    #[test]
    fn test_update_available_on_stable() {
        let check = UpdateCheck::evaluate(
            &Version::parse("4.0.0").unwrap(),
            &feed(),
            "stable",
            Utc::now(),
        )
        .unwrap();
        assert_eq!(check.status, UpdateStatus::UpdateAvailable);
        assert_eq!(check.available.to_string(), "4.0.1");
    }

    #[test]
    fn test_prerelease_channel_can_be_behind_installed() {
        let check = UpdateCheck::evaluate(
            &Version::parse("4.1.0").unwrap(),
            &feed(),
            "development",
            Utc::now(),
        )
        .unwrap();
        assert_eq!(check.status, UpdateStatus::Ahead);
    }

    #[test]
    fn test_missing_channel() {
        let result = UpdateCheck::evaluate(
            &Version::parse("4.0.0").unwrap(),
            &feed(),
            "nightly",
            Utc::now(),
        );
        assert!(matches!(result, Err(UpdateError::UnknownChannel(_))));
    }

    #[test]
    fn test_malformed_feed_version() {
        let broken = VersionFeed {
            stable: Some("four".into()),
            ..VersionFeed::default()
        };
        let result = UpdateCheck::evaluate(
            &Version::parse("4.0.0").unwrap(),
            &broken,
            "stable",
            Utc::now(),
        );
        assert!(matches!(result, Err(UpdateError::InvalidVersion(_))));
    }

    #[test]
    fn test_health_report() {
        let current = HashMap::from([(keys::SCHEMA_VERSION.to_owned(), APP_VERSION.to_owned())]);
        let healthy = HealthReport::new(&Settings::from_entries(&current), true);
        assert!(healthy.schema_matches);
        assert!(healthy.healthy);

        let unrecorded = HealthReport::new(&Settings::defaults(), true);
        assert!(unrecorded.schema_version.is_empty());
        assert!(!unrecorded.schema_matches);
        assert!(!unrecorded.healthy);

        let stored = HashMap::from([(keys::SCHEMA_VERSION.to_owned(), "0.0.1".to_owned())]);
        let outdated = HealthReport::new(&Settings::from_entries(&stored), true);
        assert!(!outdated.schema_matches);
        assert!(!outdated.healthy);

        let readonly = HealthReport::new(&Settings::from_entries(&current), false);
        assert!(!readonly.healthy);
    }

    #[tokio::test]
    async fn test_unconfigured_feed() {
        let service = UpdateService::new(None);
        assert!(!service.is_configured());
        assert!(matches!(
            service.feed().await,
            Err(UpdateError::NotConfigured)
        ));
    }

    async fn serve(app: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{addr}/versions.json")).unwrap()
    }

    #[tokio::test]
    async fn test_feed_is_fetched_and_cached() {
        let url = serve(Router::new().route("/versions.json", get(|| async { Json(feed()) }))).await;
        let service = UpdateService::new(Some(url));

        let first = service.feed().await.unwrap();
        assert_eq!(*first, feed());
        let second = service.feed().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(service.cached_check("stable").await.is_some());

        service.refresh().await;
        assert!(service.cached_check("stable").await.is_none());
    }

    #[tokio::test]
    async fn test_feed_error_status() {
        let url = serve(Router::new()).await;
        let service = UpdateService::new(Some(url));
        assert!(matches!(service.feed().await, Err(UpdateError::Status(404))));
    }
}
