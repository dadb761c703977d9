//! faqbase core - shared types and pure logic.
//!
//! This crate is used by every faqbase component:
//! - `site` - public knowledge base pages and REST API
//! - `admin` - administration panel
//! - `cli` - migrations, seeding and user bootstrap
//!
//! # Architecture
//!
//! The core crate contains types and pure functions only - no I/O, no
//! database access, no HTTP clients.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, emails, logins, language codes and statuses
//! - [`network`] - IP ban lists and IP anonymization
//! - [`bots`] - User agent bot detection
//! - [`category_tree`] - Category hierarchy navigation
//! - [`tags`] - Tag list parsing
//! - [`version`] - Version parsing and update comparison
//! - [`search`] - Search term normalization

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bots;
pub mod category_tree;
pub mod network;
pub mod search;
pub mod tags;
pub mod types;
pub mod version;

pub use types::*;
