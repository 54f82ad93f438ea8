use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// The three independent log streams.
///
/// Unlike a conventional level, severities are not ordered: each one has its
/// own directory under the log root and its own set of daily files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    /// General operational messages
    Info,
    /// Failures
    Error,
    /// Conditions an operator should look at
    Alarm,
}

impl Severity {
    /// All severities, in directory-creation order.
    pub const ALL: [Severity; 3] = [Severity::Info, Severity::Error, Severity::Alarm];

    /// Name used both as the directory name and as the `[Level]` field value.
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Error => "Error",
            Severity::Alarm => "Alarm",
        }
    }

    /// Dense index, used for per-severity slots.
    pub(crate) const fn index(self) -> usize {
        match self {
            Severity::Info => 0,
            Severity::Error => 1,
            Severity::Alarm => 2,
        }
    }

    /// Maps a `log` facade level onto a stream.
    pub fn from_log_level(level: log::Level) -> Self {
        match level {
            log::Level::Error => Severity::Error,
            log::Level::Warn => Severity::Alarm,
            log::Level::Info | log::Level::Debug | log::Level::Trace => Severity::Info,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no severity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity: {0:?}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "error" => Ok(Severity::Error),
            "alarm" => Ok(Severity::Alarm),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}
