//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::SiteConfig;
use crate::services::TrackingLog;
use crate::settings::SettingsService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SiteConfig,
    pool: PgPool,
    settings: SettingsService,
    tracking: TrackingLog,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: SiteConfig, pool: PgPool) -> Self {
        let settings = SettingsService::new(pool.clone());
        let tracking = TrackingLog::new(config.tracking_dir());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                settings,
                tracking,
            }),
        }
    }

    /// Get a reference to the site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
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

    /// Daily tracking log files.
    #[must_use]
    pub fn tracking(&self) -> &TrackingLog {
        &self.inner.tracking
    }
}
