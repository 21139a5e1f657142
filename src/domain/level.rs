use crate::domain::error::{LoggingError, LoggingResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity level of a log record or threshold of a logger/handler.
///
/// Levels are ordered; a logger processes a record when the record's level is
/// greater than or equal to the logger's effective level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// No level set; defer to the parent logger
    NotSet = 0,
    Debug = 10,
    Info = 20,
    Warning = 30,
    Error = 40,
    Critical = 50,
}

/// Verbosity name accepted in `TRANSFORMERS_VERBOSITY` that maps to DEBUG and
/// also turns on the detail formatter.
pub const DETAIL: &str = "detail";

/// Recognized verbosity names, in the order they are reported to users.
pub const LOG_LEVELS: &[(&str, Level)] = &[
    (DETAIL, Level::Debug),
    ("debug", Level::Debug),
    ("info", Level::Info),
    ("warning", Level::Warning),
    ("error", Level::Error),
    ("critical", Level::Critical),
];

/// Level used by the library root logger when nothing else is configured.
pub const DEFAULT_LOG_LEVEL: Level = Level::Warning;

impl Level {
    pub const WARN: Level = Level::Warning;
    pub const FATAL: Level = Level::Critical;

    /// Numeric value of the level
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Upper-case level name as it appears in formatted output
    pub fn name(self) -> &'static str {
        match self {
            Level::NotSet => "NOTSET",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        }
    }

    /// Resolve a verbosity name from the level table.
    ///
    /// Matching is exact: `"INFO"` is not a recognized verbosity name.
    pub fn from_verbosity_name(name: &str) -> Option<Level> {
        LOG_LEVELS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, level)| *level)
    }

    /// Comma separated list of the recognized verbosity names
    pub fn verbosity_names() -> String {
        LOG_LEVELS
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::NotSet
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Level {
    type Err = LoggingError;

    /// Parse either a verbosity name (`"info"`, `"detail"`) or a level name in
    /// any case (`"WARNING"`, `"warn"`, `"fatal"`, `"notset"`).
    fn from_str(s: &str) -> LoggingResult<Self> {
        if let Some(level) = Level::from_verbosity_name(s) {
            return Ok(level);
        }

        match s.to_ascii_lowercase().as_str() {
            "notset" => Ok(Level::NotSet),
            "debug" | "detail" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            "fatal" | "critical" => Ok(Level::Critical),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warning,
            tracing::Level::ERROR => Level::Error,
        }
    }
}
