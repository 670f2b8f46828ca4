//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (read or generate `x-request-id`, recorded on the span)
//! 4. CORS
//! 5. Deadline (per-request cancellation token)
//!
//! Authentication is done per route by the [`RequireCaller`] and
//! [`RequireAdmin`] extractors.

pub mod auth;
pub mod deadline;
pub mod request_id;

pub use auth::{RequireAdmin, RequireCaller};
pub use deadline::{RequestCancellation, deadline_middleware};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
