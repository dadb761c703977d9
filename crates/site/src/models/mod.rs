//! Domain models for the knowledge base.
//!
//! Row types that need validation live next to their repositories in
//! [`crate::db`]; the structs here are what services and templates use.

pub mod category;
pub mod faq;
pub mod session;
pub mod tag;
pub mod user;
pub mod visitor;

pub use category::{Category, CategoryInput};
pub use faq::{Faq, FaqInput, FaqRevision, FaqSummary};
pub use session::{CurrentUser, keys as session_keys};
pub use tag::{Tag, TagCount};
pub use user::User;
pub use visitor::{DailyVisits, SearchTermCount, VisitorSession};
