//! Typed configuration for TinyApp.
//!
//! - TOML and JSON files
//! - `.env` files and `PREFIX__SECTION__KEY` environment overrides
//! - strict parsing (unknown fields are rejected)
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8080"
//! shutdown_timeout_secs = 30
//! request_timeout_ms = 30000
//! max_body_bytes = 2097152
//!
//! [app]
//! site_path = "/shop"
//! trust_request_id = false
//! expose_errors = false
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! - `TINYAPP__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `TINYAPP__APP__SITE_PATH=/shop`
//! - `TINYAPP__LOGGING__FORMAT=pretty`

#![doc(html_root_url = "https://docs.rs/tinyapp-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::TinyAppConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{AppSection, LoggingSection, ServerSection};
pub use tinyapp_telemetry::LogFormat;
