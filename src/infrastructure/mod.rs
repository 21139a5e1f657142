// Infrastructure module - Environment, configuration files and tracing
pub mod config;
pub mod env;
pub mod logging;
