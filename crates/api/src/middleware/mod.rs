//! HTTP middleware stack for the reviews service.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with `request_id` field)
//! 3. Request ID (honour or generate `x-request-id`)
//! 4. Session layer (tower-sessions, read by the auth extractors)

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::OptionalAuth;
pub use request_id::request_id_middleware;
pub use session::{create_session_layer, postgres_session_layer};
