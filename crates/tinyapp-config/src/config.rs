//! The root configuration type.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use tinyapp_telemetry::LogFormat;

use crate::{AppSection, ConfigError, LoggingSection, ServerSection};

/// Complete TinyApp configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and the
/// environment.
///
/// # Example
///
/// ```
/// use tinyapp_config::TinyAppConfig;
///
/// let config = TinyAppConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct TinyAppConfig {
    /// HTTP host settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Application settings.
    #[serde(default)]
    pub app: AppSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl TinyAppConfig {
    /// Local development preset: pretty debug logs, internal errors exposed.
    #[must_use]
    pub fn development() -> Self {
        Self {
            server: ServerSection {
                http_addr: "127.0.0.1:8080".to_string(),
                ..ServerSection::default()
            },
            app: AppSection {
                expose_errors: true,
                ..AppSection::default()
            },
            logging: LoggingSection {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                ..LoggingSection::default()
            },
        }
    }

    /// Production preset: JSON info logs.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Checks cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid(
                "server.max_body_bytes",
                "must be greater than zero",
            ));
        }

        let site_path = &self.app.site_path;
        if !site_path.is_empty() && (!site_path.starts_with('/') || site_path.ends_with('/')) {
            return Err(ConfigError::invalid(
                "app.site_path",
                "must be empty or start with '/' and not end with '/'",
            ));
        }

        if self.logging.enabled {
            tinyapp_telemetry::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid("logging.level", e.to_string()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(TinyAppConfig::default().validate().is_ok());
        assert!(TinyAppConfig::development().validate().is_ok());
        assert!(TinyAppConfig::production().validate().is_ok());
    }

    #[test]
    fn test_invalid_addr() {
        let mut config = TinyAppConfig::default();
        config.server.http_addr = "localhost".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
    }

    #[test]
    fn test_site_path_rules() {
        let mut config = TinyAppConfig::default();
        config.app.site_path = "/shop".to_string();
        assert!(config.validate().is_ok());

        config.app.site_path = "shop".to_string();
        assert!(config.validate().is_err());

        config.app.site_path = "/shop/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_body_limit() {
        let mut config = TinyAppConfig::default();
        config.server.max_body_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = TinyAppConfig::default();
        config.logging.level = "tinyapp=loud".to_string();
        assert!(config.validate().is_err());

        config.logging.enabled = false;
        assert!(config.validate().is_ok());
    }
}
