//! Library-scoped verbosity control.
//!
//! [`VerbosityController`] wraps the library root logger of a
//! [`LoggerRegistry`]: it lazily installs one shared stderr handler, sets the
//! initial level from `TRANSFORMERS_VERBOSITY`, isolates library output from
//! ancestor loggers, and exposes level, handler, propagation and format
//! controls. A process-wide instance backs the free functions at the bottom
//! of this module.

use crate::core::handler::{Handler, HandlerRef, StderrSink};
use crate::core::registry::{Logger, LoggerRegistry};
use crate::domain::config::LoggingSettings;
use crate::domain::format::Formatter;
use crate::domain::level::{Level, DEFAULT_LOG_LEVEL, DETAIL, LOG_LEVELS};
use crate::infrastructure::env::{EnvSource, ProcessEnv, VERBOSITY_VAR};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Logger receiving captured warnings
pub const WARNINGS_LOGGER: &str = "py.warnings";

static GLOBAL: Lazy<Arc<VerbosityController>> =
    Lazy::new(|| Arc::new(VerbosityController::new(Arc::new(ProcessEnv))));

/// Top-level crate name, used as the library root logger name
pub fn library_name() -> &'static str {
    module_path!()
        .split("::")
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("main")
}

/// Verbosity controller for one library root logger
pub struct VerbosityController {
    registry: LoggerRegistry,
    library_name: String,
    default_handler: Mutex<Option<HandlerRef>>,
    capture_warnings: AtomicBool,
}

impl VerbosityController {
    /// Create a controller over a fresh registry
    pub fn new(env: Arc<dyn EnvSource>) -> Self {
        Self::with_library_name(env, library_name())
    }

    /// Create a controller whose root logger has a custom name
    pub fn with_library_name(env: Arc<dyn EnvSource>, name: &str) -> Self {
        Self {
            registry: LoggerRegistry::new(env),
            library_name: name.to_string(),
            default_handler: Mutex::new(None),
            capture_warnings: AtomicBool::new(false),
        }
    }

    /// The process-wide controller, reading the real environment
    pub fn global() -> &'static Arc<VerbosityController> {
        &GLOBAL
    }

    pub fn registry(&self) -> &LoggerRegistry {
        &self.registry
    }

    pub fn library_name(&self) -> &str {
        &self.library_name
    }

    /// The shared default handler, if it has been created
    pub fn default_handler(&self) -> Option<HandlerRef> {
        self.default_handler.lock().clone()
    }

    fn library_root_logger(&self) -> Arc<Logger> {
        self.registry.get_logger(&self.library_name)
    }

    /// Level named by `TRANSFORMERS_VERBOSITY`, warning about unknown names
    fn default_logging_level(&self) -> Level {
        let Some(name) = self.registry.env().non_empty(VERBOSITY_VAR) else {
            return DEFAULT_LOG_LEVEL;
        };

        match Level::from_verbosity_name(&name) {
            Some(level) => level,
            None => {
                self.warn_unknown_verbosity(&name);
                DEFAULT_LOG_LEVEL
            }
        }
    }

    /// Warn on the registry root, once per unknown name
    fn warn_unknown_verbosity(&self, name: &str) {
        self.registry.root().warning_once(&format!(
            "Unknown option {}={}, has to be one of: {}",
            VERBOSITY_VAR,
            name,
            Level::verbosity_names()
        ));
    }

    /// Install the default handler on the library root logger once
    fn configure(&self) {
        let mut slot = self.default_handler.lock();
        if slot.is_some() {
            return;
        }

        let handler = Arc::new(Handler::new(StderrSink::new()).with_name("default"));
        let root = self.library_root_logger();
        root.add_handler(&handler);
        root.set_level(self.default_logging_level());

        if self.registry.env().var(VERBOSITY_VAR).as_deref() == Some(DETAIL) {
            handler.set_formatter(Some(Formatter::Detail));
        }

        root.set_propagate(false);
        *slot = Some(handler);

        debug!(
            logger = %self.library_name,
            level = %root.level(),
            "default handler attached to library root logger"
        );
    }

    /// Detach and forget the default handler and clear the root level.
    ///
    /// The next operation that configures the controller creates a new
    /// default handler.
    pub fn reset(&self) {
        let mut slot = self.default_handler.lock();
        let Some(handler) = slot.take() else {
            return;
        };

        let root = self.library_root_logger();
        root.remove_handler(&handler);
        root.set_level(Level::NotSet);
        debug!(logger = %self.library_name, "library root logger reset");
    }

    /// Logger named `name`, or the library root logger when `None`
    pub fn get_logger(&self, name: Option<&str>) -> Arc<Logger> {
        self.configure();
        self.registry
            .get_logger(name.unwrap_or(self.library_name.as_str()))
    }

    /// Effective level of the library root logger
    pub fn get_verbosity(&self) -> Level {
        self.configure();
        self.library_root_logger().effective_level()
    }

    pub fn set_verbosity(&self, verbosity: Level) {
        self.configure();
        self.library_root_logger().set_level(verbosity);
        debug!(logger = %self.library_name, level = %verbosity, "verbosity changed");
    }

    pub fn set_verbosity_info(&self) {
        self.set_verbosity(Level::Info);
    }

    pub fn set_verbosity_warning(&self) {
        self.set_verbosity(Level::Warning);
    }

    pub fn set_verbosity_debug(&self) {
        self.set_verbosity(Level::Debug);
    }

    pub fn set_verbosity_error(&self) {
        self.set_verbosity(Level::Error);
    }

    fn expect_default_handler(&self) -> HandlerRef {
        match self.default_handler() {
            Some(handler) => handler,
            None => panic!("default handler of the library root logger has not been created"),
        }
    }

    /// Detach the default handler from the library root logger.
    ///
    /// # Panics
    ///
    /// Panics if there is no default handler.
    pub fn disable_default_handler(&self) {
        self.configure();
        let handler = self.expect_default_handler();
        self.library_root_logger().remove_handler(&handler);
    }

    /// Re-attach the default handler to the library root logger.
    ///
    /// # Panics
    ///
    /// Panics if there is no default handler.
    pub fn enable_default_handler(&self) {
        self.configure();
        let handler = self.expect_default_handler();
        self.library_root_logger().add_handler(&handler);
    }

    /// Attach a caller-supplied handler to the library root logger
    pub fn add_handler(&self, handler: &HandlerRef) {
        self.configure();
        self.library_root_logger().add_handler(handler);
    }

    /// Detach a caller-supplied handler from the library root logger.
    ///
    /// # Panics
    ///
    /// Panics if the handler is not attached.
    pub fn remove_handler(&self, handler: &HandlerRef) {
        self.configure();
        let root = self.library_root_logger();
        assert!(
            root.has_handler(handler),
            "handler is not attached to the library root logger"
        );
        root.remove_handler(handler);
    }

    /// Stop library records from reaching ancestor loggers (the default)
    pub fn disable_propagation(&self) {
        self.configure();
        self.library_root_logger().set_propagate(false);
    }

    /// Let library records reach ancestor loggers. Disable the default
    /// handler too if an ancestor already writes to stderr, or every record
    /// is printed twice.
    pub fn enable_propagation(&self) {
        self.configure();
        self.library_root_logger().set_propagate(true);
    }

    /// Switch every handler currently attached to the library root logger to
    /// `[LEVEL|FILE:LINE] TIME >> MESSAGE`
    pub fn enable_explicit_format(&self) {
        for handler in self.library_root_logger().handlers() {
            handler.set_formatter(Some(Formatter::Explicit));
        }
    }

    /// Remove custom formatting from every handler currently attached to the
    /// library root logger
    pub fn reset_format(&self) {
        for handler in self.library_root_logger().handlers() {
            handler.set_formatter(None);
        }
    }

    /// Route captured warnings into the `py.warnings` logger.
    ///
    /// The warnings logger gets the default handler if it has none and takes
    /// the library root logger's level. Which events count as warnings is up
    /// to the installed capture layer, see
    /// [`crate::infrastructure::logging::WarningsLayer`].
    pub fn capture_warnings(&self, capture: bool) {
        let logger = self.get_logger(Some(WARNINGS_LOGGER));

        if logger.handlers().is_empty() {
            if let Some(handler) = self.default_handler() {
                logger.add_handler(&handler);
            }
        }

        logger.set_level(self.library_root_logger().level());
        self.capture_warnings.store(capture, Ordering::SeqCst);
        info!(capture, "warnings capture toggled");
    }

    pub fn is_capturing_warnings(&self) -> bool {
        self.capture_warnings.load(Ordering::SeqCst)
    }

    /// Apply file/environment settings on top of the current configuration
    pub fn apply_settings(&self, settings: &LoggingSettings) {
        self.configure();

        match (settings.verbosity.as_deref(), settings.level()) {
            (_, Some(level)) => self.set_verbosity(level),
            (Some(name), None) if !name.is_empty() => self.warn_unknown_verbosity(name),
            _ => {}
        }
        if settings.verbosity.as_deref() == Some(DETAIL) {
            for handler in self.library_root_logger().handlers() {
                handler.set_formatter(Some(Formatter::Detail));
            }
        } else if settings.explicit_format() {
            self.enable_explicit_format();
        }
        if settings.propagate() {
            self.enable_propagation();
        } else {
            self.disable_propagation();
        }
        self.capture_warnings(settings.capture_warnings());
    }
}

impl std::fmt::Debug for VerbosityController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerbosityController")
            .field("library_name", &self.library_name)
            .field("configured", &self.default_handler.lock().is_some())
            .finish()
    }
}

/// Recognized verbosity names and their levels
pub fn log_levels() -> &'static [(&'static str, Level)] {
    LOG_LEVELS
}

/// Logger named `name`, or the library root logger when `None`
pub fn get_logger(name: Option<&str>) -> Arc<Logger> {
    VerbosityController::global().get_logger(name)
}

pub fn get_verbosity() -> Level {
    VerbosityController::global().get_verbosity()
}

pub fn set_verbosity(verbosity: Level) {
    VerbosityController::global().set_verbosity(verbosity);
}

pub fn set_verbosity_info() {
    VerbosityController::global().set_verbosity_info();
}

pub fn set_verbosity_warning() {
    VerbosityController::global().set_verbosity_warning();
}

pub fn set_verbosity_debug() {
    VerbosityController::global().set_verbosity_debug();
}

pub fn set_verbosity_error() {
    VerbosityController::global().set_verbosity_error();
}

pub fn enable_default_handler() {
    VerbosityController::global().enable_default_handler();
}

pub fn disable_default_handler() {
    VerbosityController::global().disable_default_handler();
}

pub fn add_handler(handler: &HandlerRef) {
    VerbosityController::global().add_handler(handler);
}

pub fn remove_handler(handler: &HandlerRef) {
    VerbosityController::global().remove_handler(handler);
}

pub fn enable_propagation() {
    VerbosityController::global().enable_propagation();
}

pub fn disable_propagation() {
    VerbosityController::global().disable_propagation();
}

pub fn enable_explicit_format() {
    VerbosityController::global().enable_explicit_format();
}

pub fn reset_format() {
    VerbosityController::global().reset_format();
}

pub fn capture_warnings(capture: bool) {
    VerbosityController::global().capture_warnings(capture);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::env::MapEnv;
    use std::thread;

    fn controller(env: MapEnv) -> VerbosityController {
        VerbosityController::with_library_name(Arc::new(env), "lib")
    }

    #[test]
    fn test_library_name_is_crate_name() {
        assert_eq!(library_name(), "transformers_logging");
        let controller = VerbosityController::new(Arc::new(MapEnv::new()));
        assert_eq!(controller.get_logger(None).name(), "transformers_logging");
    }

    #[test]
    fn test_lazy_initialization() {
        let controller = controller(MapEnv::new());
        assert!(controller.default_handler().is_none());

        let logger = controller.get_logger(None);
        let handler = controller.default_handler().unwrap();
        assert_eq!(logger.name(), "lib");
        assert!(logger.has_handler(&handler));
        assert_eq!(logger.handlers().len(), 1);
        assert_eq!(logger.level(), Level::Warning);
        assert!(!logger.propagate());
    }

    #[test]
    fn test_initialization_is_idempotent() {
        let controller = controller(MapEnv::new());
        controller.get_logger(None);
        let first = controller.default_handler().unwrap();
        controller.get_logger(Some("lib.models"));
        controller.get_verbosity();
        let second = controller.default_handler().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(controller.get_logger(None).handlers().len(), 1);
    }

    #[test]
    fn test_concurrent_first_use_creates_one_handler() {
        let controller = Arc::new(controller(MapEnv::new()));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let controller = Arc::clone(&controller);
                thread::spawn(move || controller.get_logger(None))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(controller.get_logger(None).handlers().len(), 1);
    }

    #[test]
    fn test_environment_verbosity() {
        for (name, level) in LOG_LEVELS {
            let controller = controller(MapEnv::new().with(VERBOSITY_VAR, name));
            assert_eq!(controller.get_verbosity(), *level, "{name}");
        }
    }

    #[test]
    fn test_detail_installs_detail_formatter() {
        let controller = controller(MapEnv::new().with(VERBOSITY_VAR, "detail"));
        controller.get_logger(None);
        let handler = controller.default_handler().unwrap();
        assert_eq!(handler.formatter(), Some(Formatter::Detail));

        let controller = controller_with("debug");
        controller.get_logger(None);
        assert_eq!(controller.default_handler().unwrap().formatter(), None);
    }

    fn controller_with(verbosity: &str) -> VerbosityController {
        controller(MapEnv::new().with(VERBOSITY_VAR, verbosity))
    }

    #[test]
    fn test_unknown_verbosity_falls_back() {
        let controller = controller_with("chatty");
        let (handler, sink) = Handler::memory();
        controller.registry().root().add_handler(&handler);

        let logger = controller.get_logger(None);
        assert_eq!(logger.name(), "lib");
        assert_eq!(controller.get_verbosity(), Level::Warning);
        assert_eq!(
            sink.lines(),
            vec![
                "Unknown option TRANSFORMERS_VERBOSITY=chatty, has to be one of: \
                 detail, debug, info, warning, error, critical"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_empty_verbosity_is_ignored() {
        let controller = controller_with("");
        assert_eq!(controller.get_verbosity(), Level::Warning);
    }

    #[test]
    fn test_set_and_get_verbosity() {
        let controller = controller(MapEnv::new());
        for level in [
            Level::Debug,
            Level::Info,
            Level::Warning,
            Level::Error,
            Level::Critical,
        ] {
            controller.set_verbosity(level);
            assert_eq!(controller.get_verbosity(), level);
        }

        controller.set_verbosity_info();
        assert_eq!(controller.get_verbosity(), Level::Info);
        controller.set_verbosity_warning();
        assert_eq!(controller.get_verbosity(), Level::Warning);
        controller.set_verbosity_debug();
        assert_eq!(controller.get_verbosity(), Level::Debug);
        controller.set_verbosity_error();
        assert_eq!(controller.get_verbosity(), Level::Error);
    }

    #[test]
    fn test_toggle_default_handler() {
        let controller = controller(MapEnv::new());
        let root = controller.get_logger(None);
        let handler = controller.default_handler().unwrap();

        controller.disable_default_handler();
        assert!(!root.has_handler(&handler));
        controller.disable_default_handler();
        assert!(root.handlers().is_empty());

        controller.enable_default_handler();
        controller.enable_default_handler();
        assert!(root.has_handler(&handler));
        assert_eq!(root.handlers().len(), 1);
        assert!(Arc::ptr_eq(&handler, &controller.default_handler().unwrap()));
    }

    #[test]
    fn test_add_and_remove_handler() {
        let controller = controller(MapEnv::new());
        let (handler, sink) = Handler::memory();
        controller.add_handler(&handler);
        controller.get_logger(Some("lib.models")).warning("through the root");
        assert_eq!(sink.lines(), vec!["through the root".to_string()]);

        controller.remove_handler(&handler);
        assert!(!controller.get_logger(None).has_handler(&handler));
    }

    #[test]
    #[should_panic(expected = "not attached")]
    fn test_remove_unattached_handler_panics() {
        let controller = controller(MapEnv::new());
        let (handler, _sink) = Handler::memory();
        controller.remove_handler(&handler);
    }

    #[test]
    fn test_propagation_toggle() {
        let controller = controller(MapEnv::new());
        let (ancestor, sink) = Handler::memory();
        controller.registry().root().add_handler(&ancestor);
        controller.disable_default_handler();

        controller.get_logger(None).error("isolated");
        assert!(sink.is_empty());

        controller.enable_propagation();
        assert!(controller.get_logger(None).propagate());
        controller.get_logger(None).error("shared");
        assert_eq!(sink.lines(), vec!["shared".to_string()]);

        controller.disable_propagation();
        assert!(!controller.get_logger(None).propagate());
    }

    #[test]
    fn test_explicit_format_and_reset() {
        let controller = controller(MapEnv::new());
        let (handler, sink) = Handler::memory();
        controller.add_handler(&handler);

        controller.enable_explicit_format();
        assert_eq!(
            controller.default_handler().unwrap().formatter(),
            Some(Formatter::Explicit)
        );
        controller.get_logger(None).warning("formatted");

        controller.reset_format();
        assert_eq!(handler.formatter(), None);
        controller.get_logger(None).warning("plain");

        let lines = sink.lines();
        assert!(lines[0].starts_with("[WARNING|controller.rs:"), "{}", lines[0]);
        assert!(lines[0].ends_with(" >> formatted"));
        assert_eq!(lines[1], "plain");
    }

    #[test]
    fn test_reset_allows_recreation() {
        let controller = controller(MapEnv::new());
        let root = controller.get_logger(None);
        let first = controller.default_handler().unwrap();

        controller.reset();
        assert!(controller.default_handler().is_none());
        assert!(root.handlers().is_empty());
        assert_eq!(root.level(), Level::NotSet);
        controller.reset();

        controller.get_logger(None);
        let second = controller.default_handler().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(root.handlers().len(), 1);
    }

    #[test]
    fn test_capture_warnings_configures_logger() {
        let controller = controller(MapEnv::new());
        controller.set_verbosity_info();
        controller.capture_warnings(true);

        let logger = controller.get_logger(Some(WARNINGS_LOGGER));
        let handler = controller.default_handler().unwrap();
        assert!(logger.has_handler(&handler));
        assert_eq!(logger.level(), Level::Info);
        assert!(controller.is_capturing_warnings());

        controller.capture_warnings(false);
        assert_eq!(logger.handlers().len(), 1);
        assert!(!controller.is_capturing_warnings());
    }

    #[test]
    fn test_apply_settings() {
        let controller = controller(MapEnv::new());
        controller.apply_settings(&LoggingSettings {
            verbosity: Some("info".to_string()),
            explicit_format: Some(true),
            propagate: Some(true),
            ..Default::default()
        });

        assert_eq!(controller.get_verbosity(), Level::Info);
        assert!(controller.get_logger(None).propagate());
        assert_eq!(
            controller.default_handler().unwrap().formatter(),
            Some(Formatter::Explicit)
        );
        assert!(!controller.is_capturing_warnings());
    }

    #[test]
    fn test_apply_settings_warns_on_unknown_verbosity() {
        let controller = controller(MapEnv::new());
        let (handler, sink) = Handler::memory();
        controller.registry().root().add_handler(&handler);
        controller.set_verbosity_error();

        let settings = LoggingSettings {
            verbosity: Some("loud".to_string()),
            ..Default::default()
        };
        controller.apply_settings(&settings);
        controller.apply_settings(&settings);

        assert_eq!(controller.get_verbosity(), Level::Error);
        assert_eq!(
            sink.lines(),
            vec![
                "Unknown option TRANSFORMERS_VERBOSITY=loud, has to be one of: \
                 detail, debug, info, warning, error, critical"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_log_levels_table() {
        assert_eq!(log_levels().len(), 6);
        assert_eq!(log_levels()[0], ("detail", Level::Debug));
    }
}
