// Domain module - Levels, records, formatters, settings and errors
pub mod config;
pub mod error;
pub mod format;
pub mod level;
pub mod record;
