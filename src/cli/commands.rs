use crate::cli::args::{Args, Command, ConfigCommand};
use crate::cli::output::{ConsoleWriter, OutputWriter, StatusReport};
use crate::core::controller::{log_levels, VerbosityController};
use crate::core::progress::{ProgressGate, ProgressIndicator};
use crate::domain::config::LoggingSettings;
use crate::domain::error::{LoggingError, LoggingResult};
use crate::domain::level::Level;
use crate::infrastructure::config::{apply_env_overrides, ConfigManager};
use crate::infrastructure::env::ProcessEnv;
use crate::infrastructure::logging::init_logging;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Execute CLI command
pub fn execute_command(args: Args) -> LoggingResult<()> {
    let writer = ConsoleWriter::new(args.output.clone());

    if args.diagnostics {
        if let Err(e) = init_logging() {
            writer.write_error(&format!("Failed to initialize diagnostics: {}", e))?;
        }
    }

    let config_manager = ConfigManager::new();
    let settings = load_settings(&args, &config_manager)?;

    let controller = VerbosityController::global();
    let gate = ProgressGate::global();
    controller.apply_settings(&settings);
    if !settings.progress_bars() {
        gate.disable();
    }

    match args.command {
        Command::Status => {
            writer.write_status(&StatusReport::collect(controller, gate))?;
            Ok(())
        }
        Command::Levels => {
            writer.write_levels(log_levels())?;
            Ok(())
        }
        Command::Emit {
            level,
            message,
            logger,
        } => {
            controller
                .get_logger(logger.as_deref())
                .log(level.into(), &message);
            Ok(())
        }
        Command::Once {
            message,
            repeat,
            info,
        } => {
            let logger = controller.get_logger(None);
            for _ in 0..repeat {
                if info {
                    logger.info_once(&message);
                } else {
                    logger.warning_once(&message);
                }
            }
            writer.write_message(&format!("Requested {} emissions of one message", repeat))?;
            Ok(())
        }
        Command::Advise { message } => {
            controller.get_logger(None).warning_advice(&message);
            Ok(())
        }
        Command::Progress {
            steps,
            delay_ms,
            disable,
        } => {
            if disable {
                gate.disable();
            }
            let progress = gate.progress(Some(steps));
            progress.set_message("working");
            for _ in 0..steps {
                thread::sleep(Duration::from_millis(delay_ms));
                progress.inc(1);
            }
            progress.finish();
            writer.write_message(&format!("Completed {} steps", steps))?;
            Ok(())
        }
        Command::Config(config_args) => match config_args.command {
            ConfigCommand::Show => {
                writer.write_settings(&settings)?;
                Ok(())
            }
            ConfigCommand::Init { dir } => {
                let dir = match dir {
                    Some(dir) => PathBuf::from(dir),
                    None => std::env::current_dir()?,
                };
                let path = config_manager.init_project_config(&dir)?;
                writer.write_message(&format!(
                    "Created project configuration at {}",
                    path.display()
                ))?;
                Ok(())
            }
        },
        Command::Version => {
            writer.write_message(&format!("transformers-logging {}", env!("CARGO_PKG_VERSION")))?;
            Ok(())
        }
    }
}

/// Settings from files and environment, with command line flags on top
fn load_settings(args: &Args, config_manager: &ConfigManager) -> LoggingResult<LoggingSettings> {
    let mut settings = match &args.config {
        Some(path) => {
            let mut settings = config_manager.load_settings_from_path(path.as_ref())?;
            apply_env_overrides(&mut settings, &ProcessEnv);
            settings
        }
        None => config_manager.load_with_env(&ProcessEnv)?,
    };

    if let Some(verbosity) = &args.verbosity {
        if Level::from_verbosity_name(verbosity).is_none() {
            warn!(verbosity = %verbosity, "unknown verbosity name on the command line");
            return Err(LoggingError::InvalidLevel(verbosity.clone()));
        }
        settings.verbosity = Some(verbosity.clone());
    }
    if args.explicit {
        settings.explicit_format = Some(true);
    }

    Ok(settings)
}
