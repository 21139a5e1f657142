//! Environment access.
//!
//! The controller and the progress gate read their environment through an
//! [`EnvSource`] so that tests can supply a fixed environment instead of
//! mutating the process one.

use parking_lot::RwLock;
use std::collections::HashMap;

/// Variable holding the initial verbosity name of the library root logger
pub const VERBOSITY_VAR: &str = "TRANSFORMERS_VERBOSITY";
/// Variable that silences advisory warnings when set to any non-empty value
pub const NO_ADVISORY_WARNINGS_VAR: &str = "TRANSFORMERS_NO_ADVISORY_WARNINGS";
/// Variable read once to decide whether progress bars start disabled
pub const DISABLE_PROGRESS_BARS_VAR: &str = "HF_HUB_DISABLE_PROGRESS_BARS";

/// Source of environment variables
pub trait EnvSource: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;

    /// Value of `name`, treating an empty value as unset
    fn non_empty(&self, name: &str) -> Option<String> {
        self.var(name).filter(|value| !value.is_empty())
    }

    /// Whether `name` holds one of `1`, `ON`, `YES`, `TRUE` (any case)
    fn is_true(&self, name: &str) -> bool {
        self.var(name)
            .map(|value| {
                matches!(
                    value.trim().to_ascii_uppercase().as_str(),
                    "1" | "ON" | "YES" | "TRUE"
                )
            })
            .unwrap_or(false)
    }
}

/// The real process environment, read on every lookup
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// In-memory environment
#[derive(Debug, Default)]
pub struct MapEnv {
    vars: RwLock<HashMap<String, String>>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MapEnv::set`]
    pub fn with(self, name: &str, value: &str) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&self, name: &str, value: &str) {
        self.vars.write().insert(name.to_string(), value.to_string());
    }

    pub fn remove(&self, name: &str) {
        self.vars.write().remove(name);
    }
}

impl EnvSource for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.read().get(name).cloned()
    }
}
