//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with a moka-backed store)
//! 5. Security headers (CSP, frame options, etc.)

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{Authenticated, OptionalAuth, RequireAuth, clear_login, set_login, update_user};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{MokaSessionStore, create_session_layer};
