use crate::domain::level::Level;
use serde::{Deserialize, Serialize};

/// Logging settings as read from a configuration file.
///
/// Every field is optional so that a later layer (project file, environment)
/// can override an earlier one in either direction. Use the accessors for the
/// effective values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Verbosity name (`detail`, `debug`, `info`, `warning`, `error`, `critical`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<String>,
    /// Use the explicit `[LEVEL|FILE:LINE] TIME >> MESSAGE` layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit_format: Option<bool>,
    /// Let library records reach ancestor loggers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propagate: Option<bool>,
    /// Show progress bars
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_bars: Option<bool>,
    /// Route captured warnings into the `py.warnings` logger
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_warnings: Option<bool>,
}

impl LoggingSettings {
    /// Level named by `verbosity`, if it is a recognized verbosity name
    pub fn level(&self) -> Option<Level> {
        self.verbosity
            .as_deref()
            .and_then(Level::from_verbosity_name)
    }

    pub fn explicit_format(&self) -> bool {
        self.explicit_format.unwrap_or(false)
    }

    pub fn propagate(&self) -> bool {
        self.propagate.unwrap_or(false)
    }

    pub fn progress_bars(&self) -> bool {
        self.progress_bars.unwrap_or(true)
    }

    pub fn capture_warnings(&self) -> bool {
        self.capture_warnings.unwrap_or(false)
    }

    /// Overlay every value `other` sets on top of `self`
    pub fn merge(&mut self, other: LoggingSettings) {
        if other.verbosity.is_some() {
            self.verbosity = other.verbosity;
        }
        if other.explicit_format.is_some() {
            self.explicit_format = other.explicit_format;
        }
        if other.propagate.is_some() {
            self.propagate = other.propagate;
        }
        if other.progress_bars.is_some() {
            self.progress_bars = other.progress_bars;
        }
        if other.capture_warnings.is_some() {
            self.capture_warnings = other.capture_warnings;
        }
    }
}
