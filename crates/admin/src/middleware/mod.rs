//! HTTP middleware stack for admin.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, attach request data)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `PostgreSQL` store, `SameSite=Strict`)
//! 5. Security headers
//! 6. Rate limiting on the login form (governor)
//!
//! Request id, security headers and the rate limiter are shared with the
//! site.

pub mod auth;
pub mod session;

pub use auth::{RequireStaff, RequireSuperAdmin, clear_current_admin, set_current_admin};
pub use session::create_session_layer;
