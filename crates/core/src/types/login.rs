//! Login name type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Login`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("login must be between {min} and {max} characters")]
    Length { min: usize, max: usize },
    #[error("login may only contain letters, digits and . _ @ -")]
    InvalidCharacter,
}

/// A validated login name: 3 to 64 characters of `A-Z a-z 0-9 _ . @ -`.
///
/// ```
/// use faqbase_core::Login;
///
/// assert!(Login::parse("jane.doe").is_ok());
/// assert!(Login::parse("jd").is_err());
/// assert!(Login::parse("jane doe").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Login(String);

impl Login {
    pub const MIN_LENGTH: usize = 3;
    pub const MAX_LENGTH: usize = 64;

    /// Parse a login name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError`] if the length or character set is invalid.
    pub fn parse(s: &str) -> Result<Self, LoginError> {
        let s = s.trim();
        let len = s.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&len) {
            return Err(LoginError::Length {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
            });
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '@' | '-'))
        {
            return Err(LoginError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Login {
    type Error = LoginError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Login> for String {
    fn from(login: Login) -> Self {
        login.0
    }
}

impl AsRef<str> for Login {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_email_like_logins() {
        assert!(Login::parse("editor@faq.example").is_ok());
        assert!(Login::parse("a-b_c.d").is_ok());
    }

    #[test]
    fn test_length_bounds() {
        assert!(Login::parse("abc").is_ok());
        assert!(Login::parse(&"x".repeat(64)).is_ok());
        assert!(matches!(Login::parse("ab"), Err(LoginError::Length { .. })));
        assert!(matches!(
            Login::parse(&"x".repeat(65)),
            Err(LoginError::Length { .. })
        ));
    }

    #[test]
    fn test_rejects_non_ascii_and_symbols() {
        assert_eq!(Login::parse("jürgen"), Err(LoginError::InvalidCharacter));
        assert_eq!(Login::parse("root;drop"), Err(LoginError::InvalidCharacter));
    }
}
