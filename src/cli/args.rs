use crate::domain::level::Level;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(
    name = "transformers-logging",
    version = env!("CARGO_PKG_VERSION"),
    about = "Library-scoped verbosity control and gated progress bars",
    long_about = "Drives the library root logger and the progress-bar gate from the command line. \
                  TRANSFORMERS_VERBOSITY, TRANSFORMERS_NO_ADVISORY_WARNINGS and \
                  HF_HUB_DISABLE_PROGRESS_BARS are honored."
)]
pub struct Args {
    /// Verbosity name (detail, debug, info, warning, error, critical)
    #[arg(short, long, global = true)]
    pub verbosity: Option<String>,

    /// Use the [LEVEL|FILE:LINE] TIME >> MESSAGE layout
    #[arg(short, long, global = true)]
    pub explicit: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Print this tool's own tracing diagnostics (filtered by RUST_LOG)
    #[arg(long, global = true)]
    pub diagnostics: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the state of the library root logger and the progress gate
    Status,
    /// List recognized verbosity names
    Levels,
    /// Emit one record
    Emit {
        /// Severity of the record
        #[arg(value_enum)]
        level: LevelArg,
        /// Message text
        message: String,
        /// Logger name (defaults to the library root logger)
        #[arg(short, long)]
        logger: Option<String>,
    },
    /// Emit the same message repeatedly through warning_once / info_once
    Once {
        /// Message text
        message: String,
        /// Number of attempts
        #[arg(short, long, default_value = "3")]
        repeat: usize,
        /// Use info_once instead of warning_once
        #[arg(long)]
        info: bool,
    },
    /// Emit an advisory warning
    Advise {
        /// Message text
        message: String,
    },
    /// Run a progress bar over a number of steps
    Progress {
        /// Number of steps
        #[arg(short, long, default_value = "100")]
        steps: u64,
        /// Delay per step in milliseconds
        #[arg(short, long, default_value = "10")]
        delay_ms: u64,
        /// Disable progress bars first
        #[arg(long)]
        disable: bool,
    },
    /// Configuration management commands
    Config(ConfigArgs),
    /// Display version information
    Version,
}

/// Configuration management arguments
#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective settings
    Show,
    /// Create a default project configuration
    Init {
        /// Directory to create it in (defaults to the current directory)
        #[arg(short, long)]
        dir: Option<String>,
    },
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
}

/// Severity argument
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum LevelArg {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl From<LevelArg> for Level {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Debug => Self::Debug,
            LevelArg::Info => Self::Info,
            LevelArg::Warning => Self::Warning,
            LevelArg::Error => Self::Error,
            LevelArg::Critical => Self::Critical,
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Text
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
