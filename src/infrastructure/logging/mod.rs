// Logging module - tracing integration
//
// Two concerns live here: the crate's own diagnostics go through `tracing`
// and `init_logging` installs the subscriber for them, and `WarningsLayer`
// turns `tracing` WARN events from other crates into records on the
// `py.warnings` logger while warnings capture is on.
use crate::core::controller::{library_name, VerbosityController, WARNINGS_LOGGER};
use crate::domain::level::Level;
use crate::domain::record::LogRecord;
use chrono::Local;
use std::io;
use std::sync::Arc;
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Layer forwarding captured warnings into a controller's registry
pub struct WarningsLayer {
    controller: Arc<VerbosityController>,
}

impl WarningsLayer {
    pub fn new(controller: Arc<VerbosityController>) -> Self {
        Self { controller }
    }

    /// Whether an event with this target and level is a captured warning
    fn captures(&self, target: &str, level: &tracing::Level) -> bool {
        *level == tracing::Level::WARN
            && self.controller.is_capturing_warnings()
            && !is_own_target(target)
    }
}

/// Whether `target` is this crate or one of its modules
fn is_own_target(target: &str) -> bool {
    let name = library_name();
    target
        .strip_prefix(name)
        .map(|rest| rest.is_empty() || rest.starts_with("::"))
        .unwrap_or(false)
}

impl<S> Layer<S> for WarningsLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !self.captures(metadata.target(), metadata.level()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let Some(message) = visitor.message else {
            return;
        };

        let file = metadata.file().unwrap_or("<unknown>");
        let line = metadata.line().unwrap_or(0);
        let record = LogRecord {
            logger: WARNINGS_LOGGER.to_string(),
            level: Level::from(metadata.level()),
            message: format!("{}:{}: {}: {}", file, line, metadata.target(), message),
            pathname: file.to_string(),
            lineno: line,
            created: Local::now(),
        };

        self.controller
            .registry()
            .get_logger(WARNINGS_LOGGER)
            .handle(&record);
    }
}

/// Visitor to extract the message from a tracing event
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        }
    }
}

/// Initialize the diagnostic subscriber for this crate and install the
/// warnings-capture layer for the process-wide controller
pub fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = format!("{}=info,warn", library_name());
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(WarningsLayer::new(Arc::clone(VerbosityController::global())))
        .try_init()?;

    tracing::debug!("transformers-logging diagnostics initialized");
    Ok(())
}
