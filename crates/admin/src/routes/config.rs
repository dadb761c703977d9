//! Runtime settings (super admin only).

use askama::Template;
use axum::{
    Form,
    extract::{Query, State},
    response::{Html, Redirect},
};
use tracing::instrument;

use faqbase_site::settings::{DEFINITIONS, SettingKind, SettingRow, SettingsError, keys};

use super::{AdminPage, Flash, checked, redirect_error, redirect_notice, render};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireSuperAdmin;
use crate::state::AppState;

/// One editable field of the settings form.
#[derive(Debug, Clone)]
pub struct ConfigField {
    pub key: &'static str,
    pub input: &'static str,
    pub value: String,
    pub enabled: bool,
    pub options: &'static [&'static str],
    pub multiline: bool,
    pub is_default: bool,
}

impl From<SettingRow> for ConfigField {
    fn from(row: SettingRow) -> Self {
        let (input, options) = match row.kind {
            SettingKind::Bool => ("checkbox", &[][..]),
            SettingKind::Number => ("number", &[][..]),
            SettingKind::Text => ("text", &[][..]),
            SettingKind::Secret => ("password", &[][..]),
            SettingKind::Choice(options) => ("select", options),
            SettingKind::ReadOnly => ("readonly", &[][..]),
        };
        let enabled = row.value == "true";
        let value = if matches!(row.kind, SettingKind::Secret) {
            String::new()
        } else {
            row.value
        };
        Self {
            key: row.key,
            input,
            value,
            enabled,
            options,
            multiline: matches!(row.key, keys::BOT_IGNORE_LIST | keys::BANNED_IPS),
            is_default: row.is_default,
        }
    }
}

/// Settings form.
#[derive(Template)]
#[template(path = "config.html")]
pub struct ConfigTemplate {
    pub page: AdminPage,
    pub fields: Vec<ConfigField>,
}

fn submitted<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Settings to store from a submitted form.
///
/// Unchecked boxes are absent from the form and stored as `false`. A blank
/// secret keeps its stored value. Read-only settings are never written.
fn config_entries(pairs: &[(String, String)]) -> Vec<(&'static str, String)> {
    DEFINITIONS
        .iter()
        .filter_map(|def| match def.kind {
            SettingKind::ReadOnly => None,
            SettingKind::Bool => Some((def.key, checked(submitted(pairs, def.key)).to_string())),
            SettingKind::Secret => submitted(pairs, def.key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| (def.key, v.to_owned())),
            SettingKind::Number | SettingKind::Text | SettingKind::Choice(_) => {
                submitted(pairs, def.key).map(|v| (def.key, v.to_owned()))
            }
        })
        .collect()
}

/// All settings with their effective values.
///
/// # Errors
///
/// Returns an error if the settings cannot be read.
#[instrument(skip_all)]
pub async fn index(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    Query(flash): Query<Flash>,
) -> Result<Html<String>> {
    let fields = state
        .settings()
        .all()
        .await?
        .into_iter()
        .map(ConfigField::from)
        .collect();

    Ok(render(&ConfigTemplate {
        page: AdminPage::new(&admin, "/config", flash),
        fields,
    }))
}

/// Store the submitted settings. Nothing is written if any value is invalid.
///
/// # Errors
///
/// Returns an error if the settings cannot be written.
#[instrument(skip_all)]
pub async fn update(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect> {
    let entries = config_entries(&pairs);
    let borrowed: Vec<(&str, &str)> = entries.iter().map(|(k, v)| (*k, v.as_str())).collect();

    match state.settings().set_many(&borrowed).await {
        Ok(()) => {
            tracing::info!(user_id = %admin.id, count = borrowed.len(), "Configuration saved");
            Ok(redirect_notice("/config", "Configuration saved."))
        }
        Err(e @ (SettingsError::Invalid { .. } | SettingsError::UnknownKey(_))) => {
            Ok(redirect_error("/config", &e.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn entry<'a>(entries: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        entries.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_unchecked_boxes_are_false() {
        let entries = config_entries(&pairs(&[
            (keys::TITLE, "Help Center"),
            (keys::TRACKING_ENABLED, "on"),
        ]));
        assert_eq!(entry(&entries, keys::TITLE), Some("Help Center"));
        assert_eq!(entry(&entries, keys::TRACKING_ENABLED), Some("true"));
        assert_eq!(entry(&entries, keys::MAINTENANCE_MODE), Some("false"));
    }

    #[test]
    fn test_blank_secret_is_kept() {
        let entries = config_entries(&pairs(&[(keys::API_CLIENT_TOKEN, "  ")]));
        assert_eq!(entry(&entries, keys::API_CLIENT_TOKEN), None);

        let entries = config_entries(&pairs(&[(keys::API_CLIENT_TOKEN, "s3cret")]));
        assert_eq!(entry(&entries, keys::API_CLIENT_TOKEN), Some("s3cret"));
    }

    #[test]
    fn test_read_only_settings_are_ignored() {
        let entries = config_entries(&pairs(&[
            (keys::SCHEMA_VERSION, "0.0.1"),
            (keys::LAST_CHECKED, "yesterday"),
        ]));
        assert_eq!(entry(&entries, keys::SCHEMA_VERSION), None);
        assert_eq!(entry(&entries, keys::LAST_CHECKED), None);
    }

    #[test]
    fn test_secret_value_is_not_rendered() {
        let field = ConfigField::from(SettingRow {
            key: keys::API_CLIENT_TOKEN,
            kind: SettingKind::Secret,
            value: "s3cret".to_string(),
            is_default: false,
        });
        assert_eq!(field.input, "password");
        assert!(field.value.is_empty());
    }
}
