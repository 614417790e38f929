//! Request-scoped pipeline stages.
//!
//! Stage order per request (outermost first):
//! logging → origin filter → authentication → handler. Any failed
//! stage short-circuits to an error envelope; the handler is never
//! reached.

pub mod auth;
pub mod logging;
pub mod origin;

pub use auth::auth_middleware;
pub use logging::request_log_middleware;
pub use origin::origin_filter_middleware;
