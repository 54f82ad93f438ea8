use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Settings for a [`FileLogger`](crate::FileLogger).
///
/// Deserializable so host applications can embed it in their own config
/// files; omitted fields take their defaults.
///
/// ```
/// # use daily_logger::LoggerConfig;
/// let config = LoggerConfig::new("/tmp/app-logs").with_thread_name("audit-flush");
/// assert_eq!(config.thread_name, "audit-flush");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Directory holding the `Info`, `Error` and `Alarm` subdirectories
    pub root: PathBuf,
    /// Name given to the flush thread
    pub thread_name: String,
    /// First wait after a failed flush cycle
    pub retry_backoff_initial_ms: u64,
    /// Upper bound for the doubling backoff
    pub retry_backoff_max_ms: u64,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("Log"),
            thread_name: "daily-logger-flush".to_string(),
            retry_backoff_initial_ms: 50,
            retry_backoff_max_ms: 5_000,
        }
    }
}

impl LoggerConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn with_retry_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.retry_backoff_initial_ms = initial.as_millis() as u64;
        self.retry_backoff_max_ms = max.as_millis() as u64;
        self
    }

    pub fn retry_backoff_initial(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_initial_ms.max(1))
    }

    pub fn retry_backoff_max(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_max_ms).max(self.retry_backoff_initial())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LoggerConfig = serde_json::from_str(r#"{ "root": "/srv/logs" }"#).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/logs"));
        assert_eq!(config.thread_name, LoggerConfig::default().thread_name);
        assert_eq!(config.retry_backoff_initial(), Duration::from_millis(50));
    }

    #[test]
    fn test_backoff_bounds_are_sane() {
        let config = LoggerConfig::new("x").with_retry_backoff(Duration::ZERO, Duration::ZERO);
        assert_eq!(config.retry_backoff_initial(), Duration::from_millis(1));
        assert_eq!(config.retry_backoff_max(), Duration::from_millis(1));
    }
}
