// Core module - Logger registry, verbosity controller and progress gate
pub mod controller;
pub mod handler;
pub mod progress;
pub mod registry;

pub use controller::VerbosityController;
pub use handler::{Handler, HandlerRef, MemorySink, Sink};
pub use progress::{EmptyProgress, Progress, ProgressGate, ProgressIndicator, ProgressIter};
pub use registry::{Logger, LoggerRegistry};
