//! Request middleware: correlation ids, logging, error envelopes and
//! authentication.

mod auth;
mod error_handler;
mod logging;
mod request_id;

pub use auth::{auth_middleware, staff_middleware};
pub use error_handler::{error_envelope_middleware, error_to_status_code};
pub use logging::logging_middleware;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
