use crate::cli::args::OutputFormat;
use crate::core::controller::VerbosityController;
use crate::core::progress::ProgressGate;
use crate::domain::config::LoggingSettings;
use crate::domain::format::Formatter;
use crate::domain::level::Level;
use serde::Serialize;
use serde_json;
use std::io;

/// Output writer trait for different formats
pub trait OutputWriter {
    fn write_status(&self, status: &StatusReport) -> Result<(), OutputError>;
    fn write_levels(&self, levels: &[(&str, Level)]) -> Result<(), OutputError>;
    fn write_settings(&self, settings: &LoggingSettings) -> Result<(), OutputError>;
    fn write_message(&self, message: &str) -> Result<(), OutputError>;
    fn write_error(&self, error: &str) -> Result<(), OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<OutputError> for crate::domain::error::LoggingError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// Snapshot of the library root logger and the progress gate
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub library_name: String,
    pub verbosity: Level,
    pub propagate: bool,
    pub handlers: usize,
    pub default_handler_attached: bool,
    pub format: String,
    pub capturing_warnings: bool,
    pub progress_bars: bool,
}

impl StatusReport {
    pub fn collect(controller: &VerbosityController, gate: &ProgressGate) -> Self {
        let verbosity = controller.get_verbosity();
        let root = controller.get_logger(None);
        let default_handler = controller.default_handler();
        let format = default_handler
            .as_ref()
            .and_then(|handler| handler.formatter())
            .unwrap_or(Formatter::Implicit);

        Self {
            library_name: controller.library_name().to_string(),
            verbosity,
            propagate: root.propagate(),
            handlers: root.handlers().len(),
            default_handler_attached: default_handler
                .map(|handler| root.has_handler(&handler))
                .unwrap_or(false),
            format: format!("{:?}", format).to_lowercase(),
            capturing_warnings: controller.is_capturing_warnings(),
            progress_bars: gate.is_enabled(),
        }
    }
}

#[derive(Serialize)]
struct LevelEntry<'a> {
    name: &'a str,
    level: Level,
    value: u8,
}

/// Console output writer
pub struct ConsoleWriter {
    format: OutputFormat,
}

impl ConsoleWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl OutputWriter for ConsoleWriter {
    fn write_status(&self, status: &StatusReport) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                println!("Library root logger: {}", status.library_name);
                println!("  Verbosity: {}", status.verbosity);
                println!("  Propagate: {}", status.propagate);
                println!("  Handlers: {}", status.handlers);
                println!("  Default handler attached: {}", status.default_handler_attached);
                println!("  Format: {}", status.format);
                println!("  Capturing warnings: {}", status.capturing_warnings);
                println!("Progress bars: {}", if status.progress_bars { "enabled" } else { "disabled" });
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(status)?);
            }
        }
        Ok(())
    }

    fn write_levels(&self, levels: &[(&str, Level)]) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                for (name, level) in levels {
                    println!("{:<10} {:<9} {}", name, level, level.as_u8());
                }
            }
            OutputFormat::Json => {
                let entries: Vec<LevelEntry> = levels
                    .iter()
                    .map(|(name, level)| LevelEntry {
                        name: *name,
                        level: *level,
                        value: level.as_u8(),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            }
        }
        Ok(())
    }

    fn write_settings(&self, settings: &LoggingSettings) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                println!(
                    "verbosity: {}",
                    settings.verbosity.as_deref().unwrap_or("(default)")
                );
                println!("explicit_format: {}", settings.explicit_format());
                println!("propagate: {}", settings.propagate());
                println!("progress_bars: {}", settings.progress_bars());
                println!("capture_warnings: {}", settings.capture_warnings());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(settings)?);
            }
        }
        Ok(())
    }

    fn write_message(&self, message: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => println!("{}", message),
            OutputFormat::Json => {
                let json = serde_json::json!({ "message": message });
                println!("{}", json);
            }
        }
        Ok(())
    }

    fn write_error(&self, error: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => eprintln!("Error: {}", error),
            OutputFormat::Json => {
                let json = serde_json::json!({ "error": error });
                eprintln!("{}", json);
            }
        }
        Ok(())
    }
}
