//! Error types for the dispatch kernel.
//!
//! [`DispatchError`] covers every failure the kernel itself can raise
//! (registry lookups, argument binding, reply coercion, emission) plus a
//! [`DispatchError::Handler`] variant carrying application failures with the
//! status they should map to.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capability::Capability;

/// Result type alias using [`DispatchError`].
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Standard error type for TinyApp.
///
/// # Example
///
/// ```
/// use tinyapp_core::DispatchError;
/// use http::StatusCode;
///
/// fn load(id: i64) -> Result<String, DispatchError> {
///     if id < 0 {
///         return Err(DispatchError::handler(StatusCode::NOT_FOUND, "no such item"));
///     }
///     Ok(format!("item {id}"))
/// }
///
/// assert_eq!(load(-1).unwrap_err().status_code(), StatusCode::NOT_FOUND);
/// ```
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No provider is bound for a capability.
    #[error("unresolved capability: {capability}")]
    UnresolvedCapability {
        /// Name of the capability.
        capability: &'static str,
    },

    /// A factory (transitively) required its own capability.
    #[error("circular resolution: {}", .chain.join(" -> "))]
    CircularResolution {
        /// Capabilities on the resolution path, ending with the repeated one.
        chain: Vec<&'static str>,
    },

    /// No registry binding, pending value or default satisfies a parameter.
    #[error("unresolvable argument: {name}")]
    UnresolvableArgument {
        /// Parameter name.
        name: String,
    },

    /// A value was found but could not be converted to the declared type.
    #[error("invalid argument '{name}': expected {expected}, got {value}")]
    InvalidArgument {
        /// Parameter name.
        name: String,
        /// Expected type.
        expected: &'static str,
        /// The offending value or conversion message.
        value: String,
    },

    /// A structured reply could not be serialized to JSON.
    #[error("failed to serialize response body: {0}")]
    Serialization(#[source] serde_json::Error),

    /// An HTTP message could not be built.
    #[error("failed to build HTTP message: {0}")]
    Http(#[from] http::Error),

    /// The emitter failed to write the response.
    #[error("failed to emit response: {0}")]
    Emit(#[source] std::io::Error),

    /// Application failure raised by a handler or middleware.
    #[error("{message}")]
    Handler {
        /// HTTP status the failure maps to.
        status: StatusCode,
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl DispatchError {
    /// Creates an unresolved-capability error.
    #[must_use]
    pub fn unresolved(capability: Capability) -> Self {
        Self::UnresolvedCapability {
            capability: capability.name(),
        }
    }

    /// Creates an unresolvable-argument error.
    #[must_use]
    pub fn unresolvable(name: impl Into<String>) -> Self {
        Self::UnresolvableArgument { name: name.into() }
    }

    /// Creates an invalid-argument error.
    #[must_use]
    pub fn invalid_argument(
        name: impl Into<String>,
        expected: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            expected,
            value: value.into(),
        }
    }

    /// Creates an application error with an explicit status.
    #[must_use]
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Handler {
            status,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal application error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::handler(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Creates an internal application error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Handler {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            Self::Handler { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnresolvedCapability { .. } => "UNRESOLVED_CAPABILITY",
            Self::CircularResolution { .. } => "CIRCULAR_RESOLUTION",
            Self::UnresolvableArgument { .. } => "UNRESOLVABLE_ARGUMENT",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Http(_) => "HTTP_ERROR",
            Self::Emit(_) => "EMIT_ERROR",
            Self::Handler { .. } => "APPLICATION_ERROR",
        }
    }

    /// Converts this error to a serializable envelope.
    ///
    /// Server-side failures are reported with a generic message unless
    /// `expose` is set.
    #[must_use]
    pub fn to_envelope(&self, request_id: Option<&str>, expose: bool) -> ErrorEnvelope {
        let status = self.status_code();
        let message = if expose || !status.is_server_error() {
            self.to_string()
        } else {
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        };
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
                status: status.as_u16(),
            },
            request_id: request_id.map(ToString::to_string),
        }
    }
}

impl From<anyhow::Error> for DispatchError {
    fn from(source: anyhow::Error) -> Self {
        Self::Handler {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: source.to_string(),
            source: Some(source),
        }
    }
}

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
    /// The request ID for correlation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// HTTP status code.
    pub status: u16,
}
