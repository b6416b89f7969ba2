//! Built-in middleware.
//!
//! | Middleware | Purpose |
//! |------------|---------|
//! | [`RequestIdMiddleware`] | Assigns a request ID and echoes it in `x-request-id` |
//! | [`TraceMiddleware`] | Request span plus completion log |
//! | [`RecoverMiddleware`] | Renders errors as JSON envelopes |
//!
//! A typical application registers them outermost first:
//! request ID, trace, recover.

mod recover;
mod request_id;
mod trace;

pub use recover::RecoverMiddleware;
pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
pub use trace::TraceMiddleware;
