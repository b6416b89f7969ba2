//! Application logger capability.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, error, info, trace, warn};

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Very verbose diagnostics.
    Trace,
    /// Diagnostics.
    Debug,
    /// Normal operation.
    Info,
    /// Something unexpected but recoverable.
    Warn,
    /// A failure.
    Error,
}

impl LogLevel {
    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// A logger handlers can ask the registry for.
pub trait Logger: Send + Sync {
    /// Records a message.
    fn log(&self, level: LogLevel, message: &str);

    /// Records a debug message.
    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    /// Records an informational message.
    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Records a warning.
    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    /// Records an error.
    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

/// A [`Logger`] forwarding to `tracing`, tagging every event with a channel.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    channel: String,
}

impl TracingLogger {
    /// A logger for `channel`.
    #[must_use]
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
        }
    }

    /// The channel name.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new("app")
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        let channel = self.channel.as_str();
        match level {
            LogLevel::Trace => trace!(channel, "{message}"),
            LogLevel::Debug => debug!(channel, "{message}"),
            LogLevel::Info => info!(channel, "{message}"),
            LogLevel::Warn => warn!(channel, "{message}"),
            LogLevel::Error => error!(channel, "{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording(Mutex<Vec<(LogLevel, String)>>);

    impl Logger for Recording {
        fn log(&self, level: LogLevel, message: &str) {
            self.0.lock().push((level, message.to_string()));
        }
    }

    #[test]
    fn test_default_methods_forward_level() {
        let logger = Recording::default();
        logger.info("started");
        logger.error("failed");

        let records = logger.0.lock();
        assert_eq!(records[0], (LogLevel::Info, "started".to_string()));
        assert_eq!(records[1], (LogLevel::Error, "failed".to_string()));
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
        assert!(LogLevel::Error > LogLevel::Info);
    }

    #[test]
    fn test_tracing_logger_channel() {
        let logger = TracingLogger::default();
        assert_eq!(logger.channel(), "app");
        logger.warn("no subscriber installed");
    }
}
