//! HTTP middleware stack for the FAQ site.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, attach request data)
//! 2. Trusted proxies extension (read by client IP resolution)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Security headers
//! 7. Site gate (banned IPs, maintenance mode)
//! 8. Rate limiting on login, registration and API writes (governor)

pub mod auth;
pub mod client_ip;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;
pub mod visitor;

pub use auth::{OptionalAuth, clear_current_user, set_current_user};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
pub use visitor::site_gate_middleware;
