//! Runtime settings stored in `faq.config`.
//!
//! Every known key has a default and a kind used for validation and for
//! rendering the admin form. Loaded settings are cached for a minute and
//! the cache is dropped on every write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use faqbase_core::bots::{BotDetector, DEFAULT_BOT_IGNORE_LIST};
use faqbase_core::network::IpFilter;

use crate::db::{ConfigRepository, RepositoryError};

/// Setting keys.
pub mod keys {
    pub const TITLE: &str = "main.title";
    pub const LANGUAGE: &str = "main.language";
    pub const MAINTENANCE_MODE: &str = "main.maintenanceMode";
    pub const ENABLE_MARKDOWN: &str = "main.enableMarkdown";
    pub const SCHEMA_VERSION: &str = "main.schemaVersion";
    pub const RECORDS_PER_PAGE: &str = "records.perPage";
    pub const POPULAR_LIMIT: &str = "records.popularLimit";
    pub const TRACKING_ENABLED: &str = "tracking.enabled";
    pub const ANONYMIZE_IP: &str = "tracking.anonymizeIp";
    pub const BOT_IGNORE_LIST: &str = "tracking.botIgnoreList";
    pub const BANNED_IPS: &str = "security.bannedIPs";
    pub const ENABLE_REGISTRATION: &str = "security.enableRegistration";
    pub const API_ENABLED: &str = "api.enabled";
    pub const API_CLIENT_TOKEN: &str = "api.clientToken";
    pub const RELEASE_ENVIRONMENT: &str = "upgrade.releaseEnvironment";
    pub const LAST_CHECKED: &str = "upgrade.lastChecked";
}

/// Version of this build. `faq-cli migrate` records it as the schema
/// version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Release channels the update checker can follow.
pub const RELEASE_CHANNELS: &[&str] = &["stable", "development", "nightly"];

/// How a setting's value is validated and edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKind {
    Bool,
    Number,
    Text,
    /// Free text, shown masked.
    Secret,
    Choice(&'static [&'static str]),
    /// Maintained by the application, not editable.
    ReadOnly,
}

/// A known setting.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SettingDef {
    pub key: &'static str,
    pub default: &'static str,
    pub kind: SettingKind,
}

/// All known settings in display order.
pub const DEFINITIONS: &[SettingDef] = &[
    SettingDef { key: keys::TITLE, default: "FAQ", kind: SettingKind::Text },
    SettingDef { key: keys::LANGUAGE, default: "en", kind: SettingKind::Text },
    SettingDef { key: keys::MAINTENANCE_MODE, default: "false", kind: SettingKind::Bool },
    SettingDef { key: keys::ENABLE_MARKDOWN, default: "true", kind: SettingKind::Bool },
    SettingDef {
        key: keys::SCHEMA_VERSION,
        default: "",
        kind: SettingKind::ReadOnly,
    },
    SettingDef { key: keys::RECORDS_PER_PAGE, default: "10", kind: SettingKind::Number },
    SettingDef { key: keys::POPULAR_LIMIT, default: "5", kind: SettingKind::Number },
    SettingDef { key: keys::TRACKING_ENABLED, default: "true", kind: SettingKind::Bool },
    SettingDef { key: keys::ANONYMIZE_IP, default: "true", kind: SettingKind::Bool },
    SettingDef {
        key: keys::BOT_IGNORE_LIST,
        default: DEFAULT_BOT_IGNORE_LIST,
        kind: SettingKind::Text,
    },
    SettingDef { key: keys::BANNED_IPS, default: "", kind: SettingKind::Text },
    SettingDef { key: keys::ENABLE_REGISTRATION, default: "true", kind: SettingKind::Bool },
    SettingDef { key: keys::API_ENABLED, default: "true", kind: SettingKind::Bool },
    SettingDef { key: keys::API_CLIENT_TOKEN, default: "", kind: SettingKind::Secret },
    SettingDef {
        key: keys::RELEASE_ENVIRONMENT,
        default: "stable",
        kind: SettingKind::Choice(RELEASE_CHANNELS),
    },
    SettingDef { key: keys::LAST_CHECKED, default: "", kind: SettingKind::ReadOnly },
];

/// Errors raised when reading or writing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unknown setting: {0}")]
    UnknownKey(String),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Look up a setting definition.
#[must_use]
pub fn definition(key: &str) -> Option<&'static SettingDef> {
    DEFINITIONS.iter().find(|d| d.key == key)
}

/// Validate and normalize a value for `key`.
///
/// Booleans accept `true/false/1/0/on/off/yes/no` and are stored as
/// `true`/`false`. Read-only keys are accepted here; callers that expose
/// settings to users check [`SettingKind::ReadOnly`] themselves.
///
/// # Errors
///
/// Returns `SettingsError::UnknownKey` or `SettingsError::Invalid`.
pub fn normalize(key: &str, value: &str) -> Result<String, SettingsError> {
    let def = definition(key).ok_or_else(|| SettingsError::UnknownKey(key.to_owned()))?;
    let value = value.trim();
    let invalid = |reason: &str| SettingsError::Invalid {
        key: key.to_owned(),
        reason: reason.to_owned(),
    };

    match def.kind {
        SettingKind::Bool => parse_bool(value)
            .map(|b| b.to_string())
            .ok_or_else(|| invalid("expected true or false")),
        SettingKind::Number => match value.parse::<i64>() {
            Ok(n) if n > 0 => Ok(n.to_string()),
            _ => Err(invalid("expected a positive number")),
        },
        SettingKind::Choice(choices) => {
            if choices.contains(&value) {
                Ok(value.to_owned())
            } else {
                Err(invalid(&format!("expected one of {}", choices.join(", "))))
            }
        }
        SettingKind::Text if key == keys::LANGUAGE => faqbase_core::LanguageCode::parse(value)
            .map(|code| code.to_string())
            .map_err(|e| invalid(&e.to_string())),
        SettingKind::Text if key == keys::BANNED_IPS => {
            let (_, rejected) = IpFilter::parse(value);
            if rejected.is_empty() {
                Ok(value.to_owned())
            } else {
                Err(invalid(&format!("not an address or CIDR block: {}", rejected.join(", "))))
            }
        }
        SettingKind::Text | SettingKind::Secret | SettingKind::ReadOnly => Ok(value.to_owned()),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}

/// Typed view of all settings.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub title: String,
    pub language: String,
    pub maintenance_mode: bool,
    pub enable_markdown: bool,
    pub schema_version: String,
    pub records_per_page: i64,
    pub popular_limit: i64,
    pub tracking_enabled: bool,
    pub anonymize_ip: bool,
    pub enable_registration: bool,
    pub api_enabled: bool,
    #[serde(skip)]
    pub api_client_token: String,
    pub release_environment: String,
    pub last_checked: Option<DateTime<Utc>>,
    #[serde(skip)]
    banned_ips: IpFilter,
    #[serde(skip)]
    bots: BotDetector,
}

impl Settings {
    /// Build settings from stored key/value pairs. Missing or malformed
    /// values fall back to their defaults.
    #[must_use]
    pub fn from_entries(stored: &HashMap<String, String>) -> Self {
        let text = |key: &str| -> String {
            stored
                .get(key)
                .and_then(|v| normalize(key, v).ok())
                .or_else(|| definition(key).map(|d| d.default.to_owned()))
                .unwrap_or_default()
        };
        let flag = |key: &str| parse_bool(&text(key)).unwrap_or(false);
        let number = |key: &str| text(key).parse::<i64>().unwrap_or(1);

        let (banned_ips, rejected) = IpFilter::parse(&text(keys::BANNED_IPS));
        if !rejected.is_empty() {
            tracing::warn!(entries = ?rejected, "Ignoring invalid banned IP entries");
        }

        Self {
            title: text(keys::TITLE),
            language: text(keys::LANGUAGE),
            maintenance_mode: flag(keys::MAINTENANCE_MODE),
            enable_markdown: flag(keys::ENABLE_MARKDOWN),
            schema_version: text(keys::SCHEMA_VERSION),
            records_per_page: number(keys::RECORDS_PER_PAGE),
            popular_limit: number(keys::POPULAR_LIMIT),
            tracking_enabled: flag(keys::TRACKING_ENABLED),
            anonymize_ip: flag(keys::ANONYMIZE_IP),
            enable_registration: flag(keys::ENABLE_REGISTRATION),
            api_enabled: flag(keys::API_ENABLED),
            api_client_token: text(keys::API_CLIENT_TOKEN),
            release_environment: text(keys::RELEASE_ENVIRONMENT),
            last_checked: DateTime::parse_from_rfc3339(&text(keys::LAST_CHECKED))
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            banned_ips,
            bots: BotDetector::from_list(&text(keys::BOT_IGNORE_LIST)),
        }
    }

    /// Settings with every default applied.
    #[must_use]
    pub fn defaults() -> Self {
        Self::from_entries(&HashMap::new())
    }

    /// Parsed `security.bannedIPs`.
    #[must_use]
    pub const fn banned_ips(&self) -> &IpFilter {
        &self.banned_ips
    }

    /// Parsed `tracking.botIgnoreList`.
    #[must_use]
    pub const fn bots(&self) -> &BotDetector {
        &self.bots
    }
}

/// A setting as listed in the admin panel.
#[derive(Debug, Clone, Serialize)]
pub struct SettingRow {
    pub key: &'static str,
    pub kind: SettingKind,
    pub value: String,
    pub is_default: bool,
}

/// Cached access to runtime settings.
#[derive(Clone)]
pub struct SettingsService {
    pool: PgPool,
    cache: Cache<(), Arc<Settings>>,
}

impl SettingsService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(60))
            .build();
        Self { pool, cache }
    }

    /// Current settings, from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the settings cannot be read.
    pub async fn load(&self) -> Result<Arc<Settings>, RepositoryError> {
        if let Some(settings) = self.cache.get(&()).await {
            return Ok(settings);
        }
        let stored: HashMap<String, String> = ConfigRepository::new(&self.pool)
            .all()
            .await?
            .into_iter()
            .map(|e| (e.key, e.value))
            .collect();
        let settings = Arc::new(Settings::from_entries(&stored));
        self.cache.insert((), Arc::clone(&settings)).await;
        Ok(settings)
    }

    /// Put `settings` in the cache without reading the database.
    pub async fn prime(&self, settings: Settings) {
        self.cache.insert((), Arc::new(settings)).await;
    }

    /// Drop cached settings so the next load reads the database.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }

    /// Raw stored value, `None` when the key was never written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        ConfigRepository::new(&self.pool).get(key).await
    }

    /// Validate and store one setting.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the key is unknown, the value invalid or
    /// the write fails.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.set_many(&[(key, value)]).await
    }

    /// Validate and store several settings. Nothing is written unless
    /// every value is valid.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or the repository error.
    pub async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), SettingsError> {
        let normalized = entries
            .iter()
            .map(|(key, value)| normalize(key, value).map(|v| (*key, v)))
            .collect::<Result<Vec<_>, _>>()?;
        let pairs: Vec<(&str, &str)> = normalized.iter().map(|(k, v)| (*k, v.as_str())).collect();

        ConfigRepository::new(&self.pool).set_many(&pairs).await?;
        self.invalidate().await;
        tracing::info!(keys = ?pairs.iter().map(|(k, _)| *k).collect::<Vec<_>>(), "Settings updated");
        Ok(())
    }

    /// Every known setting with its effective value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all(&self) -> Result<Vec<SettingRow>, RepositoryError> {
        let stored: HashMap<String, String> = ConfigRepository::new(&self.pool)
            .all()
            .await?
            .into_iter()
            .map(|e| (e.key, e.value))
            .collect();
        Ok(DEFINITIONS
            .iter()
            .map(|def| match stored.get(def.key) {
                Some(value) => SettingRow {
                    key: def.key,
                    kind: def.kind,
                    value: value.clone(),
                    is_default: false,
                },
                None => SettingRow {
                    key: def.key,
                    kind: def.kind,
                    value: def.default.to_owned(),
                    is_default: true,
                },
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stored(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::defaults();
        assert_eq!(settings.title, "FAQ");
        assert_eq!(settings.language, "en");
        assert!(!settings.maintenance_mode);
        assert!(settings.tracking_enabled);
        assert!(settings.api_enabled);
        assert!(settings.api_client_token.is_empty());
        assert_eq!(settings.records_per_page, 10);
        assert!(settings.schema_version.is_empty());
        assert_eq!(settings.release_environment, "stable");
        assert!(settings.last_checked.is_none());
        assert!(settings.bots().is_bot("Googlebot/2.1"));
        assert!(settings.banned_ips().is_empty());
    }

    #[test]
    fn test_stored_values_override_defaults() {
        let settings = Settings::from_entries(&stored(&[
            (keys::TITLE, "Help Center"),
            (keys::MAINTENANCE_MODE, "on"),
            (keys::RECORDS_PER_PAGE, "25"),
            (keys::BANNED_IPS, "10.0.0.0/8"),
        ]));
        assert_eq!(settings.title, "Help Center");
        assert!(settings.maintenance_mode);
        assert_eq!(settings.records_per_page, 25);
        assert!(settings.banned_ips().is_banned("10.20.30.40".parse().unwrap()));
    }

    #[test]
    fn test_malformed_stored_values_fall_back() {
        let settings = Settings::from_entries(&stored(&[
            (keys::RECORDS_PER_PAGE, "lots"),
            (keys::RELEASE_ENVIRONMENT, "beta"),
        ]));
        assert_eq!(settings.records_per_page, 10);
        assert_eq!(settings.release_environment, "stable");
    }

    #[test]
    fn test_normalize_bool_and_number() {
        assert_eq!(normalize(keys::API_ENABLED, "Yes").unwrap(), "true");
        assert_eq!(normalize(keys::API_ENABLED, "").unwrap(), "false");
        assert!(normalize(keys::API_ENABLED, "maybe").is_err());
        assert_eq!(normalize(keys::POPULAR_LIMIT, " 7 ").unwrap(), "7");
        assert!(normalize(keys::POPULAR_LIMIT, "0").is_err());
    }

    #[test]
    fn test_normalize_rejects_bad_ban_list() {
        let err = normalize(keys::BANNED_IPS, "10.0.0.1 nonsense").unwrap_err();
        assert!(err.to_string().contains("nonsense"));
    }

    #[test]
    fn test_normalize_language() {
        assert_eq!(normalize(keys::LANGUAGE, "DE").unwrap(), "de");
        assert!(normalize(keys::LANGUAGE, "german").is_err());
    }

    #[test]
    fn test_unknown_key() {
        assert!(matches!(
            normalize("main.colour", "red"),
            Err(SettingsError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_last_checked_parses_rfc3339() {
        let settings =
            Settings::from_entries(&stored(&[(keys::LAST_CHECKED, "2026-10-01T08:30:00Z")]));
        assert_eq!(
            settings.last_checked.map(|d| d.to_rfc3339()),
            Some("2026-10-01T08:30:00+00:00".to_owned())
        );
    }
}
