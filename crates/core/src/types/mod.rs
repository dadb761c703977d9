//! Core types for faqbase.
//!
//! Type-safe wrappers for the ids, names and enums shared by every crate.

pub mod email;
pub mod id;
pub mod language;
pub mod login;
pub mod status;
pub mod tracking;

pub use email::{Email, EmailError};
pub use id::*;
pub use language::{LanguageCode, LanguageCodeError};
pub use login::{Login, LoginError};
pub use status::*;
pub use tracking::TrackingAction;
