//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the installed application version.
///
/// Usage in templates: `{{ ""|app_version }}`
#[askama::filter_fn]
pub fn app_version(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CARGO_PKG_VERSION"))
}

/// Font size class of a tag in the tag cloud, from 1 (rare) to 5 (common).
///
/// Usage in templates: `{{ tag.count|tag_weight }}`
#[askama::filter_fn]
pub fn tag_weight(count: impl Display, _env: &dyn askama::Values) -> askama::Result<u8> {
    let count: u64 = count.to_string().parse().unwrap_or(0);
    Ok(match count {
        0..=1 => 1,
        2..=4 => 2,
        5..=9 => 3,
        10..=24 => 4,
        _ => 5,
    })
}
