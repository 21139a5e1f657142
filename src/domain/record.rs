use crate::domain::level::Level;
use chrono::{DateTime, Local};
use std::panic::Location;
use std::path::Path;

/// A single log event travelling from a logger to its handlers
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Name of the logger that created the record
    pub logger: String,
    /// Severity of the record
    pub level: Level,
    /// Fully rendered message
    pub message: String,
    /// Source path of the call site
    pub pathname: String,
    /// Source line of the call site
    pub lineno: u32,
    /// Creation time
    pub created: DateTime<Local>,
}

impl LogRecord {
    /// Create a record stamped with the current local time
    pub fn new(
        logger: impl Into<String>,
        level: Level,
        message: impl Into<String>,
        location: &Location<'_>,
    ) -> Self {
        Self {
            logger: logger.into(),
            level,
            message: message.into(),
            pathname: location.file().to_string(),
            lineno: location.line(),
            created: Local::now(),
        }
    }

    /// File name component of the call site path
    pub fn filename(&self) -> &str {
        Path::new(&self.pathname)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.pathname)
    }

    /// Creation time rendered as `2024-01-31 12:00:00,123`
    pub fn asctime(&self) -> String {
        self.created.format("%Y-%m-%d %H:%M:%S,%3f").to_string()
    }
}
