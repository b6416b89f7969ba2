//! Test error types.

use thiserror::Error;
use tinyapp_core::DispatchError;

/// Errors raised while building, sending or reading a test request.
#[derive(Debug, Error)]
pub enum TestError {
    /// Request building failed
    #[error("request build error: {0}")]
    RequestBuild(String),

    /// Header name or value is invalid
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Response body reading failed
    #[error("body read error: {0}")]
    BodyRead(String),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Dispatch returned an error instead of a response
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}
