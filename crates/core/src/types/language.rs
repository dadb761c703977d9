//! Language codes attached to categories, records and searches.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned for a malformed language code.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid language code: {0}")]
pub struct LanguageCodeError(pub String);

/// A normalized language code such as `en`, `de` or `pt-br`.
///
/// Input is lowercased and `_` is accepted as region separator.
///
/// ```
/// use faqbase_core::LanguageCode;
///
/// assert_eq!(LanguageCode::parse("pt_BR").unwrap().as_str(), "pt-br");
/// assert!(LanguageCode::parse("english").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Parse and normalize a language code.
    ///
    /// # Errors
    ///
    /// Returns [`LanguageCodeError`] unless the input is a two or three
    /// letter primary code with an optional two to four character region.
    pub fn parse(s: &str) -> Result<Self, LanguageCodeError> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        let mut parts = normalized.splitn(2, '-');
        let primary = parts.next().unwrap_or_default();
        let region = parts.next();

        let primary_ok =
            (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_lowercase());
        let region_ok = region.is_none_or(|r| {
            (2..=4).contains(&r.len()) && r.chars().all(|c| c.is_ascii_alphanumeric())
        });

        if primary_ok && region_ok {
            Ok(Self(normalized))
        } else {
            Err(LanguageCodeError(s.to_owned()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        Self("en".to_owned())
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for LanguageCode {
    type Err = LanguageCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = LanguageCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LanguageCode> for String {
    fn from(code: LanguageCode) -> Self {
        code.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case_and_separator() {
        assert_eq!(LanguageCode::parse(" DE ").unwrap().as_str(), "de");
        assert_eq!(LanguageCode::parse("zh_TW").unwrap().as_str(), "zh-tw");
    }

    #[test]
    fn test_rejects_malformed_codes() {
        for bad in ["", "e", "engl", "en-", "en-toolong", "1n"] {
            assert!(LanguageCode::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_default_is_english() {
        assert_eq!(LanguageCode::default().as_str(), "en");
    }
}
