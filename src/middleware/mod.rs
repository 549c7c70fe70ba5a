//! Cross-cutting request wrappers.
//!
//! Intended order, outermost first: recovery, request id, access log,
//! CORS. Recovery sits outside everything so it also catches faults in
//! the logging layers; the request id is assigned before logging so the
//! access line can carry it.

pub mod access_log;
pub mod cors;
pub mod recovery;
pub mod request_id;

pub use access_log::AccessLogMiddleware;
pub use cors::{CorsConfig, CorsMiddleware};
pub use recovery::RecoveryMiddleware;
pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
