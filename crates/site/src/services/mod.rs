//! Business logic services.

pub mod auth;
pub mod faq;
pub mod search;
pub mod tracking;

pub use auth::{AuthError, AuthService};
pub use faq::FaqService;
pub use search::SearchService;
pub use tracking::{TrackingLog, VisitorContext, VisitorTracker};
