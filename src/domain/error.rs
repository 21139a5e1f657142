use thiserror::Error;

/// Unified error type for the fallible parts of the crate.
///
/// Misuse of the controller (disabling a handler that was never created,
/// removing a handler that is not attached) is not represented here; those
/// are programming errors and panic.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Output error: {0}")]
    Output(String),
}

pub type LoggingResult<T> = Result<T, LoggingError>;
