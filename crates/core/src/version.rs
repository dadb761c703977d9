//! Release version parsing and update comparison.
//!
//! Versions are semantic versions (`semver`). Release feeds may also
//! publish `MAJOR.MINOR` and a leading `v`, which are accepted. Build
//! metadata is dropped on parse and does not take part in ordering.

use core::cmp::Ordering;
use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned for a malformed version string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid version: {0:?}")]
pub struct VersionError(pub String);

/// A parsed release version.
///
/// ```
/// use faqbase_core::version::Version;
///
/// let beta: Version = "4.0.0-beta.2".parse().unwrap();
/// let release: Version = "v4.0.0".parse().unwrap();
/// assert!(beta < release);
/// assert_eq!(release.to_string(), "4.0.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version(semver::Version);

/// Expand `MAJOR.MINOR` to `MAJOR.MINOR.0`, keeping any suffix.
fn complete_core(s: &str) -> String {
    let split = s.find(['-', '+']).unwrap_or(s.len());
    let (core, rest) = s.split_at(split);
    if core.matches('.').count() == 1 {
        format!("{core}.0{rest}")
    } else {
        s.to_owned()
    }
}

impl Version {
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(semver::Version::new(major, minor, patch))
    }

    /// Parse a version string.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError`] if the string is not a semantic version
    /// after the leading `v` is removed and a missing patch is filled in.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let s = input.trim();
        let s = s.strip_prefix(['v', 'V']).unwrap_or(s);
        let mut version = semver::Version::parse(&complete_core(s))
            .map_err(|_| VersionError(input.to_owned()))?;
        version.build = semver::BuildMetadata::EMPTY;
        Ok(Self(version))
    }

    #[must_use]
    pub const fn major(&self) -> u64 {
        self.0.major
    }

    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.0.minor
    }

    #[must_use]
    pub const fn patch(&self) -> u64 {
        self.0.patch
    }

    /// Whether this is a pre-release (alpha, beta, RC, nightly...).
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.0.pre.is_empty()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Result of comparing the installed version against the newest release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    UpToDate,
    UpdateAvailable,
    /// The installed version is newer than any published release.
    Ahead,
}

impl UpdateStatus {
    #[must_use]
    pub fn compare(installed: &Version, available: &Version) -> Self {
        match installed.cmp(available) {
            Ordering::Less => Self::UpdateAvailable,
            Ordering::Equal => Self::UpToDate,
            Ordering::Greater => Self::Ahead,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::UpToDate => "up to date",
            Self::UpdateAvailable => "update available",
            Self::Ahead => "ahead of latest release",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_semver_precedence_chain() {
        let chain = [
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-alpha.beta",
            "1.0.0-beta",
            "1.0.0-beta.2",
            "1.0.0-beta.11",
            "1.0.0-rc.1",
            "1.0.0",
            "1.0.1",
            "1.1.0",
            "2.0.0",
        ];
        for pair in chain.windows(2) {
            if let [a, b] = pair {
                assert!(v(a) < v(b), "{a} < {b}");
            }
        }
    }

    #[test]
    fn test_two_part_and_prefixed_versions() {
        assert_eq!(v("4.0"), Version::new(4, 0, 0));
        assert_eq!(v(" v3.2.1 "), Version::new(3, 2, 1));
        assert_eq!(v("3.2.1+build.7"), Version::new(3, 2, 1));
        assert_eq!(v("4.1-beta.2").to_string(), "4.1.0-beta.2");
        assert_eq!(v("4.1+nightly").to_string(), "4.1.0");
        let parsed = v("7.8.9");
        assert_eq!((parsed.major(), parsed.minor(), parsed.patch()), (7, 8, 9));
    }

    #[test]
    fn test_prerelease_identifiers_keep_their_case() {
        assert_eq!(v("1.0.0-RC.1").to_string(), "1.0.0-RC.1");
        assert_ne!(v("1.0.0-RC.1"), v("1.0.0-rc.1"));
        // ASCII order: uppercase sorts first.
        assert!(v("1.0.0-RC.1") < v("1.0.0-rc.1"));
        assert!(v("4.0.0-rc.1").is_prerelease());
        assert!(!v("4.0.0").is_prerelease());
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["", "4", "4.x.0", "4.0.0.1", "4.0.0-", "4.0.0-beta..1", "-1.0.0"] {
            assert!(Version::parse(bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn test_update_status() {
        assert_eq!(
            UpdateStatus::compare(&v("4.0.1"), &v("4.0.2")),
            UpdateStatus::UpdateAvailable
        );
        assert_eq!(
            UpdateStatus::compare(&v("4.0.2"), &v("4.0.2")),
            UpdateStatus::UpToDate
        );
        assert_eq!(
            UpdateStatus::compare(&v("4.1.0-beta.1"), &v("4.0.2")),
            UpdateStatus::Ahead
        );
        assert_eq!(
            UpdateStatus::compare(&v("4.0.0-beta.1"), &v("4.0.0")),
            UpdateStatus::UpdateAvailable
        );
    }

    #[test]
    fn test_serde_uses_string_form() {
        let json = serde_json::to_string(&v("1.2.3-beta.1")).unwrap();
        assert_eq!(json, "\"1.2.3-beta.1\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v("1.2.3-beta.1"));
    }
}
