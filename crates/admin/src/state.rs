//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use faqbase_site::services::TrackingLog;
use faqbase_site::settings::SettingsService;

use crate::config::AdminConfig;
use crate::services::UpdateService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    settings: SettingsService,
    tracking: TrackingLog,
    updates: UpdateService,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool) -> Self {
        let settings = SettingsService::new(pool.clone());
        let tracking = TrackingLog::new(config.tracking_dir());
        let updates = UpdateService::new(config.update_feed_url.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                settings,
                tracking,
                updates,
            }),
        }
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Runtime settings.
    #[must_use]
    pub fn settings(&self) -> &SettingsService {
        &self.inner.settings
    }

    /// Tracking log files written by the site.
    #[must_use]
    pub fn tracking(&self) -> &TrackingLog {
        &self.inner.tracking
    }

    /// Version feed client.
    #[must_use]
    pub fn updates(&self) -> &UpdateService {
        &self.inner.updates
    }
}
