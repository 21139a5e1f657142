//! Transformers Logging Library
//!
//! Library-scoped verbosity control: a lazily configured library root logger
//! with one shared stderr handler, level and propagation controls, explicit
//! formatting, once-only and advisory warnings, and a gate that hands out
//! real or no-op progress bars.
//!
//! ```no_run
//! use transformers_logging::{get_logger, set_verbosity_info};
//!
//! set_verbosity_info();
//! let logger = get_logger(Some("transformers_logging.models"));
//! logger.info("loading weights");
//! logger.warning_once("falling back to slow tokenizer");
//! ```

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use crate::core::controller::{
    add_handler, capture_warnings, disable_default_handler, disable_propagation,
    enable_default_handler, enable_explicit_format, enable_propagation, get_logger,
    get_verbosity, log_levels, remove_handler, reset_format, set_verbosity, set_verbosity_debug,
    set_verbosity_error, set_verbosity_info, set_verbosity_warning, VerbosityController,
};
pub use crate::core::handler::{Handler, HandlerRef, MemorySink, Sink};
pub use crate::core::progress::{
    disable_progress_bar, enable_progress_bar, get_lock, is_progress_bar_enabled, progress,
    progress_iter, set_lock, EmptyProgress, Progress, ProgressGate, ProgressIndicator,
    ProgressIter, ProgressIteratorExt,
};
pub use crate::core::registry::{Logger, LoggerRegistry};
pub use domain::config::LoggingSettings;
pub use domain::error::{LoggingError, LoggingResult};
pub use domain::format::Formatter;
pub use domain::level::Level;
