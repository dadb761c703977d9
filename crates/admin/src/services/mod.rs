//! Admin services.
//!
//! Content, account and statistics logic lives in the site library; the
//! admin adds the update checker.

pub mod updates;

pub use updates::{HealthReport, UpdateCheck, UpdateError, UpdateService, VersionFeed};
