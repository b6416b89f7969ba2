//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;

use crate::{ConfigError, TinyAppConfig};

/// Configuration loader.
///
/// Layers apply in order, later ones overriding earlier ones:
/// 1. defaults (or a preset)
/// 2. a TOML or JSON file
/// 3. a `.env` file, feeding the environment
/// 4. environment variables `PREFIX__SECTION__KEY`
///
/// # Example
///
/// ```no_run
/// use tinyapp_config::ConfigLoader;
///
/// # fn main() -> Result<(), tinyapp_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("tinyapp.toml")?
///     .with_dotenv()?
///     .with_env_prefix("TINYAPP")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: TinyAppConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// A loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: TinyAppConfig::default(),
            env_prefix: None,
        }
    }

    /// Starts from the development preset.
    ///
    /// ```
    /// use tinyapp_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// assert!(config.app.expose_errors);
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = TinyAppConfig::development();
        self
    }

    /// Starts from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = TinyAppConfig::production();
        self
    }

    /// Loads a file; the format follows the extension (`.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Missing or unreadable file, parse errors, unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::missing_file(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::unreadable(path, e))?;
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        self.config = parse(&content, format)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// As [`with_file`](Self::with_file) when the file exists.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration from a string in `format` ("toml" or "json").
    ///
    /// ```
    /// use tinyapp_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[app]\nsite_path = \"/shop\"", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    /// assert_eq!(config.app.site_path, "/shop");
    /// ```
    ///
    /// # Errors
    ///
    /// Parse errors, unknown fields, unsupported format.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Loads `.env` from the current directory, if there is one.
    ///
    /// # Errors
    ///
    /// The file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(err) if err.not_found() => Ok(self),
            Err(err) => Err(err.into()),
        }
    }

    /// Enables environment overrides under `prefix`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Applies environment overrides and validates.
    ///
    /// # Errors
    ///
    /// Unparseable override values or a failed [`TinyAppConfig::validate`].
    pub fn load(mut self) -> Result<TinyAppConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_vars(&prefix, env::vars())?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> TinyAppConfig {
        self.config
    }

    fn apply_env_vars<I>(&mut self, prefix: &str, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let marker = format!("{prefix}__");
        for (key, value) in vars {
            if let Some(path) = key.strip_prefix(&marker) {
                self.apply_env_var(&key, path, &value)?;
            }
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, path: &str, value: &str) -> Result<(), ConfigError> {
        let parts: Vec<&str> = path.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_number(key, value)?;
            }
            ["SERVER", "REQUEST_TIMEOUT_MS"] => {
                config.server.request_timeout_ms = parse_number(key, value)?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => {
                config.server.max_body_bytes = parse_number(key, value)?;
            }

            ["APP", "SITE_PATH"] => config.app.site_path = value.to_string(),
            ["APP", "TRUST_REQUEST_ID"] => {
                config.app.trust_request_id = parse_flag(key, value)?;
            }
            ["APP", "EXPOSE_ERRORS"] => config.app.expose_errors = parse_flag(key, value)?,

            ["LOGGING", "ENABLED"] => config.logging.enabled = parse_flag(key, value)?,
            ["LOGGING", "LEVEL"] => config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                config.logging.format = value
                    .parse()
                    .map_err(|reason: String| ConfigError::env_override(key, reason))?;
            }

            _ => {}
        }
        Ok(())
    }
}

fn parse(content: &str, format: &str) -> Result<TinyAppConfig, ConfigError> {
    match format.to_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_override(key, "expected integer"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::env_override(key, "expected boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tinyapp_telemetry::LogFormat;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_loader_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, TinyAppConfig::default());
    }

    #[test]
    fn test_loader_with_production() {
        let config = ConfigLoader::new().with_production().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(!config.app.expose_errors);
    }

    #[test]
    fn test_with_string_json() {
        let json = r#"{"server": {"http_addr": "127.0.0.1:3000"}, "logging": {"format": "pretty"}}"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.http_addr, "127.0.0.1:3000");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_with_string_unknown_field() {
        let result = ConfigLoader::new().with_string("[server]\nport = 80", "toml");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_with_string_unsupported_format() {
        let result = ConfigLoader::new().with_string("", "yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(f)) if f == "yaml"));
    }

    #[test]
    fn test_with_file_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nrequest_timeout_ms = 250\n\n[app]\nsite_path = \"/blog\"\ntrust_request_id = true"
        )
        .unwrap();

        let config = ConfigLoader::new()
            .with_file(file.path())
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.request_timeout_ms, 250);
        assert_eq!(config.app.site_path, "/blog");
        assert!(config.app.trust_request_id);
    }

    #[test]
    fn test_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/tinyapp.toml");
        assert!(matches!(result, Err(ConfigError::MissingFile { .. })));
    }

    #[test]
    fn test_with_optional_file_missing() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/tinyapp.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.server.http_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_env_overrides() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_vars(
                "TEST",
                vars(&[
                    ("TEST__SERVER__HTTP_ADDR", "127.0.0.1:9000"),
                    ("TEST__SERVER__MAX_BODY_BYTES", "1024"),
                    ("TEST__APP__EXPOSE_ERRORS", "yes"),
                    ("TEST__LOGGING__FORMAT", "pretty"),
                    ("OTHER__SERVER__HTTP_ADDR", "10.0.0.1:1"),
                    ("TEST__UNKNOWN__KEY", "ignored"),
                ]),
            )
            .unwrap();

        let config = loader.load_unvalidated();
        assert_eq!(config.server.http_addr, "127.0.0.1:9000");
        assert_eq!(config.server.max_body_bytes, 1024);
        assert!(config.app.expose_errors);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_env_override_invalid_values() {
        let mut loader = ConfigLoader::new();
        let err = loader
            .apply_env_vars("TEST", vars(&[("TEST__SERVER__REQUEST_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("TEST__SERVER__REQUEST_TIMEOUT_MS"));

        let err = loader
            .apply_env_vars("TEST", vars(&[("TEST__LOGGING__ENABLED", "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("expected boolean"));

        assert!(loader
            .apply_env_vars("TEST", vars(&[("TEST__LOGGING__FORMAT", "xml")]))
            .is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("K", "ON").unwrap());
        assert!(!parse_flag("K", "0").unwrap());
        assert!(parse_flag("K", "").is_err());
    }
}
