//! Hierarchical logger registry.
//!
//! Loggers are identified by dotted names (`lib.models.bert`). A logger's
//! parent is the nearest existing logger whose name is a dotted prefix of its
//! own, or the registry root. Records travel from a logger to its handlers,
//! then up the parent chain for as long as `propagate` is set. When no
//! handler is found anywhere on the way, WARNING and above go to a
//! last-resort stderr handler.

use crate::core::handler::{Handler, HandlerRef, StderrSink};
use crate::domain::level::{Level, DEFAULT_LOG_LEVEL};
use crate::domain::record::LogRecord;
use crate::infrastructure::env::{EnvSource, NO_ADVISORY_WARNINGS_VAR};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::Location;
use std::sync::{Arc, Weak};

/// Name under which the registry root is looked up
pub const ROOT_LOGGER_NAME: &str = "root";

/// Collection of named loggers sharing a root
#[derive(Clone)]
pub struct LoggerRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    root: Arc<Logger>,
    loggers: RwLock<HashMap<String, Arc<Logger>>>,
    env: Arc<dyn EnvSource>,
    last_resort: HandlerRef,
    // Unbounded for the registry lifetime; keys are (logger name, message).
    warned_once: Mutex<HashSet<(String, String)>>,
    informed_once: Mutex<HashSet<(String, String)>>,
}

#[derive(Debug, Clone)]
struct LoggerState {
    level: Level,
    handlers: Vec<HandlerRef>,
    propagate: bool,
}

/// A registry entry. Obtained from [`LoggerRegistry::get_logger`] and shared
/// as `Arc<Logger>`.
pub struct Logger {
    name: String,
    state: RwLock<LoggerState>,
    registry: Weak<RegistryInner>,
}

/// Turn a Rust module path (`lib::models::bert`) into a dotted logger name
pub fn normalize_name(name: &str) -> String {
    name.replace("::", ".")
}

impl LoggerRegistry {
    /// Create an empty registry whose root sits at WARNING
    pub fn new(env: Arc<dyn EnvSource>) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<RegistryInner>| RegistryInner {
            root: Arc::new(Logger::new(String::new(), DEFAULT_LOG_LEVEL, weak.clone())),
            loggers: RwLock::new(HashMap::new()),
            env,
            last_resort: Arc::new(Handler::new(StderrSink::new())),
            warned_once: Mutex::new(HashSet::new()),
            informed_once: Mutex::new(HashSet::new()),
        });
        inner.last_resort.set_level(Level::Warning);
        Self { inner }
    }

    /// The root entry
    pub fn root(&self) -> Arc<Logger> {
        Arc::clone(&self.inner.root)
    }

    /// Look up a logger, creating it on first use.
    ///
    /// An empty name or `"root"` yields the root entry. `::` separators are
    /// accepted and treated as dots, so `module_path!()` works as a name.
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        if name.is_empty() || name == ROOT_LOGGER_NAME {
            return self.root();
        }

        let name = normalize_name(name);
        if let Some(logger) = self.inner.loggers.read().get(&name) {
            return Arc::clone(logger);
        }

        let mut loggers = self.inner.loggers.write();
        let logger = loggers.entry(name.clone()).or_insert_with(|| {
            Arc::new(Logger::new(
                name,
                Level::NotSet,
                Arc::downgrade(&self.inner),
            ))
        });
        Arc::clone(logger)
    }

    /// Whether a logger with this name has been created
    pub fn contains(&self, name: &str) -> bool {
        self.inner.loggers.read().contains_key(&normalize_name(name))
    }

    /// Names of all non-root loggers, sorted
    pub fn logger_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.loggers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Environment the registry consults for advisory suppression
    pub fn env(&self) -> Arc<dyn EnvSource> {
        Arc::clone(&self.inner.env)
    }

    /// Handler used when a record finds no handler at all
    pub fn last_resort(&self) -> HandlerRef {
        Arc::clone(&self.inner.last_resort)
    }
}

impl fmt::Debug for LoggerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerRegistry")
            .field("loggers", &self.logger_names())
            .finish()
    }
}

impl RegistryInner {
    fn lookup_parent(&self, name: &str) -> Arc<Logger> {
        let loggers = self.loggers.read();
        let mut prefix = name;
        while let Some(idx) = prefix.rfind('.') {
            prefix = &prefix[..idx];
            if let Some(logger) = loggers.get(prefix) {
                return Arc::clone(logger);
            }
        }
        Arc::clone(&self.root)
    }
}

impl Logger {
    fn new(name: String, level: Level, registry: Weak<RegistryInner>) -> Self {
        Self {
            name,
            state: RwLock::new(LoggerState {
                level,
                handlers: Vec::new(),
                propagate: true,
            }),
            registry,
        }
    }

    /// Dotted name; empty for the registry root
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_root(&self) -> bool {
        self.name.is_empty()
    }

    /// Level set directly on this logger
    pub fn level(&self) -> Level {
        self.state.read().level
    }

    pub fn set_level(&self, level: Level) {
        self.state.write().level = level;
    }

    /// Nearest existing ancestor; `None` for the root
    pub fn parent(&self) -> Option<Arc<Logger>> {
        if self.is_root() {
            return None;
        }
        self.registry
            .upgrade()
            .map(|registry| registry.lookup_parent(&self.name))
    }

    /// First level set on this logger or one of its ancestors
    pub fn effective_level(&self) -> Level {
        let level = self.level();
        if level != Level::NotSet {
            return level;
        }

        let mut next = self.parent();
        while let Some(logger) = next {
            let level = logger.level();
            if level != Level::NotSet {
                return level;
            }
            next = logger.parent();
        }
        Level::NotSet
    }

    pub fn is_enabled_for(&self, level: Level) -> bool {
        level >= self.effective_level()
    }

    pub fn propagate(&self) -> bool {
        self.state.read().propagate
    }

    pub fn set_propagate(&self, propagate: bool) {
        self.state.write().propagate = propagate;
    }

    /// Attach a handler; attaching the same handler twice is a no-op
    pub fn add_handler(&self, handler: &HandlerRef) {
        let mut state = self.state.write();
        if !state.handlers.iter().any(|h| Arc::ptr_eq(h, handler)) {
            state.handlers.push(Arc::clone(handler));
        }
    }

    /// Detach a handler, returning whether it was attached
    pub fn remove_handler(&self, handler: &HandlerRef) -> bool {
        let mut state = self.state.write();
        let before = state.handlers.len();
        state.handlers.retain(|h| !Arc::ptr_eq(h, handler));
        state.handlers.len() != before
    }

    pub fn has_handler(&self, handler: &HandlerRef) -> bool {
        self.state
            .read()
            .handlers
            .iter()
            .any(|h| Arc::ptr_eq(h, handler))
    }

    /// Handlers attached directly to this logger, in attachment order
    pub fn handlers(&self) -> Vec<HandlerRef> {
        self.state.read().handlers.clone()
    }

    /// Whether this logger or any ancestor reachable through propagation has
    /// a handler
    pub fn has_handlers(&self) -> bool {
        if !self.state.read().handlers.is_empty() {
            return true;
        }
        if !self.propagate() {
            return false;
        }

        let mut next = self.parent();
        while let Some(logger) = next {
            if !logger.state.read().handlers.is_empty() {
                return true;
            }
            next = if logger.propagate() {
                logger.parent()
            } else {
                None
            };
        }
        false
    }

    /// Emit `message` at `level`, recording the caller as the source location
    #[track_caller]
    pub fn log(&self, level: Level, message: &str) {
        if !self.is_enabled_for(level) {
            return;
        }
        let record = LogRecord::new(self.name.as_str(), level, message, Location::caller());
        self.call_handlers(&record);
    }

    /// Dispatch an already built record, subject to this logger's level
    pub fn handle(&self, record: &LogRecord) {
        if self.is_enabled_for(record.level) {
            self.call_handlers(record);
        }
    }

    #[track_caller]
    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    #[track_caller]
    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    #[track_caller]
    pub fn warning(&self, message: &str) {
        self.log(Level::Warning, message);
    }

    #[track_caller]
    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    #[track_caller]
    pub fn critical(&self, message: &str) {
        self.log(Level::Critical, message);
    }

    /// Like [`Logger::warning`], but a given message is emitted at most once
    /// per logger for the lifetime of the registry.
    ///
    /// The memo is keyed by message only, not by call site: two call sites
    /// logging the same text through the same logger share one emission. The
    /// message counts as seen even if the current level filtered it out.
    #[track_caller]
    pub fn warning_once(&self, message: &str) {
        if self.first_time(|inner| &inner.warned_once, message) {
            self.warning(message);
        }
    }

    /// Like [`Logger::info`], with the same once-only contract as
    /// [`Logger::warning_once`]
    #[track_caller]
    pub fn info_once(&self, message: &str) {
        if self.first_time(|inner| &inner.informed_once, message) {
            self.info(message);
        }
    }

    /// Like [`Logger::warning`], but silent while
    /// `TRANSFORMERS_NO_ADVISORY_WARNINGS` is set to a non-empty value
    #[track_caller]
    pub fn warning_advice(&self, message: &str) {
        let suppressed = self
            .registry
            .upgrade()
            .map(|registry| registry.env.non_empty(NO_ADVISORY_WARNINGS_VAR).is_some())
            .unwrap_or(false);
        if suppressed {
            return;
        }
        self.warning(message);
    }

    fn first_time<F>(&self, memo: F, message: &str) -> bool
    where
        F: FnOnce(&RegistryInner) -> &Mutex<HashSet<(String, String)>>,
    {
        match self.registry.upgrade() {
            Some(registry) => memo(&registry)
                .lock()
                .insert((self.name.clone(), message.to_string())),
            None => true,
        }
    }

    fn call_handlers(&self, record: &LogRecord) {
        let mut found = 0usize;

        found += Self::dispatch(&self.handlers(), record);
        let mut next = if self.propagate() { self.parent() } else { None };
        while let Some(logger) = next {
            found += Self::dispatch(&logger.handlers(), record);
            next = if logger.propagate() {
                logger.parent()
            } else {
                None
            };
        }

        if found == 0 {
            if let Some(registry) = self.registry.upgrade() {
                registry.last_resort.handle(record);
            }
        }
    }

    fn dispatch(handlers: &[HandlerRef], record: &LogRecord) -> usize {
        for handler in handlers {
            handler.handle(record);
        }
        handlers.len()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &state.level)
            .field("handlers", &state.handlers.len())
            .field("propagate", &state.propagate)
            .finish()
    }
}
