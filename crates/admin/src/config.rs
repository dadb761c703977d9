//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_BASE_URL` - Public URL for the admin panel
//! - `ADMIN_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_DATA_DIR` - Directory shared with the site for tracking logs
//!   (default: `SITE_DATA_DIR`, then ./data)
//! - `ADMIN_UPDATE_FEED_URL` - JSON feed with the newest release per channel;
//!   update checks are disabled without it
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE` - Error tracking

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use url::Url;

use faqbase_site::config::{
    ConfigError, SentryConfig, get_database_url, get_env_or_default, get_optional_env,
    get_required_env, get_validated_secret, validate_session_secret,
};

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the admin panel
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Root directory of the tracking logs written by the site
    pub data_dir: PathBuf,
    /// Version feed used by the update checker
    pub update_feed_url: Option<Url>,
    pub sentry: SentryConfig,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("ADMIN_DATABASE_URL")?;
        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("ADMIN_BASE_URL")?;
        Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_BASE_URL".to_string(), e.to_string()))?;
        let session_secret = get_validated_secret("ADMIN_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "ADMIN_SESSION_SECRET")?;
        let data_dir = get_optional_env("ADMIN_DATA_DIR")
            .or_else(|| get_optional_env("SITE_DATA_DIR"))
            .map_or_else(|| PathBuf::from("./data"), PathBuf::from);
        let update_feed_url = parse_feed_url(get_optional_env("ADMIN_UPDATE_FEED_URL"))?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_secret,
            data_dir,
            update_feed_url,
            sentry: SentryConfig::from_env()?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Directory holding the daily tracking logs.
    #[must_use]
    pub fn tracking_dir(&self) -> PathBuf {
        self.data_dir.join("tracking")
    }
}

/// Parse the update feed URL. Only HTTP(S) feeds are accepted.
fn parse_feed_url(raw: Option<String>) -> Result<Option<Url>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let url = Url::parse(&raw).map_err(|e| {
        ConfigError::InvalidEnvVar("ADMIN_UPDATE_FEED_URL".to_string(), e.to_string())
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "ADMIN_UPDATE_FEED_URL".to_string(),
            format!("unsupported scheme {}", url.scheme()),
        ));
    }
    Ok(Some(url))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_url_is_optional() {
        assert!(parse_feed_url(None).unwrap().is_none());
    }

    #[test]
    fn test_feed_url_accepts_https() {
        let url = parse_feed_url(Some("https://updates.example.org/versions.json".into()))
            .unwrap()
            .unwrap();
        assert_eq!(url.host_str(), Some("updates.example.org"));
    }

    #[test]
    fn test_feed_url_rejects_other_schemes() {
        assert!(matches!(
            parse_feed_url(Some("file:///etc/passwd".into())),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(parse_feed_url(Some("not a url".into())).is_err());
    }
}
