//! Logging setup for TinyApp applications.
//!
//! The dispatch kernel and the built-in middleware emit `tracing` events
//! with structured fields (`method`, `uri`, `status`, `capability`,
//! `request_id`). This crate installs a `tracing-subscriber` pipeline that
//! renders them either as JSON lines (production) or in a human-readable
//! form (development).
//!
//! # Example
//!
//! ```rust,no_run
//! use tinyapp_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development()).unwrap();
//! tracing::info!(route = "users.show", "ready");
//! ```

#![doc(html_root_url = "https://docs.rs/tinyapp-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
