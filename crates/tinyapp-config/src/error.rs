//! Configuration errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required file does not exist.
    #[error("config file {} does not exist", path.display())]
    MissingFile {
        /// The missing path.
        path: PathBuf,
    },

    /// A file exists but could not be read.
    #[error("cannot read config file {}", path.display())]
    Unreadable {
        /// The unreadable path.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: io::Error,
    },

    /// Malformed TOML or an unknown key.
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed JSON or an unknown key.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// A `.env` file that does not parse.
    #[error("invalid .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// A value that parses but breaks a constraint.
    #[error("{field}: {reason}")]
    Invalid {
        /// Dotted field path, e.g. `server.http_addr`.
        field: &'static str,
        /// The broken constraint.
        reason: String,
    },

    /// An environment override that does not parse.
    #[error("{var}: {reason}")]
    EnvOverride {
        /// The variable name.
        var: String,
        /// Expected shape of the value.
        reason: String,
    },

    /// Neither `toml` nor `json`.
    #[error("unsupported config format '{0}'")]
    UnsupportedFormat(String),
}

impl ConfigError {
    pub(crate) fn missing_file(path: impl Into<PathBuf>) -> Self {
        Self::MissingFile { path: path.into() }
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn env_override(var: &str, reason: impl Into<String>) -> Self {
        Self::EnvOverride {
            var: var.to_string(),
            reason: reason.into(),
        }
    }
}
