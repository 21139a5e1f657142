//! Handlers and the sinks they write to.
//!
//! A [`Handler`] owns a level threshold, an optional [`Formatter`] and a
//! [`Sink`]. Handlers are shared as [`HandlerRef`] and compared by identity,
//! so the same handler can be attached to several loggers and later detached.

use crate::domain::error::LoggingResult;
use crate::domain::format::Formatter;
use crate::domain::level::Level;
use crate::domain::record::LogRecord;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Shared handle to a handler
pub type HandlerRef = Arc<Handler>;

/// Destination of formatted log lines
pub trait Sink: Send + Sync {
    /// Write one formatted line (without trailing newline)
    fn write_line(&self, line: &str) -> io::Result<()>;

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

type StreamFactory = Box<dyn Fn() -> Box<dyn Write> + Send + Sync>;

#[cfg(unix)]
const EBADF: i32 = 9;
#[cfg(windows)]
const EBADF: i32 = 6;
#[cfg(not(any(unix, windows)))]
const EBADF: i32 = -1;

/// Whether an error means the stream is gone for good
fn is_closed_stream(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::BrokenPipe || err.raw_os_error() == Some(EBADF)
}

/// Standard error stream.
///
/// A broken pipe or a closed descriptor switches the sink to discarding
/// output for the rest of its life. Other write errors are returned to the
/// handler and the next record is tried again.
pub struct StderrSink {
    stream: StreamFactory,
    discarding: AtomicBool,
}

impl StderrSink {
    pub fn new() -> Self {
        Self::with_writer(|| Box::new(io::stderr()))
    }

    /// Sink over another stream, opened anew for every write
    pub fn with_writer<F>(stream: F) -> Self
    where
        F: Fn() -> Box<dyn Write> + Send + Sync + 'static,
    {
        Self {
            stream: Box::new(stream),
            discarding: AtomicBool::new(false),
        }
    }

    /// Whether the stream has been given up on
    pub fn is_discarding(&self) -> bool {
        self.discarding.load(Ordering::Relaxed)
    }

    fn check(&self, result: io::Result<()>) -> io::Result<()> {
        match result {
            Err(e) if is_closed_stream(&e) => {
                self.discarding.store(true, Ordering::Relaxed);
                Ok(())
            }
            other => other,
        }
    }
}

impl Default for StderrSink {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StderrSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StderrSink")
            .field("discarding", &self.is_discarding())
            .finish()
    }
}

impl Sink for StderrSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        if self.is_discarding() {
            return Ok(());
        }
        let mut stream = (self.stream)();
        self.check(writeln!(stream, "{}", line))
    }

    fn flush(&self) -> io::Result<()> {
        if self.is_discarding() {
            return Ok(());
        }
        let mut stream = (self.stream)();
        self.check(stream.flush())
    }
}

/// Any writer, e.g. an open file
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write_line(&self, line: &str) -> io::Result<()> {
        writeln!(self.writer.lock(), "{}", line)
    }

    fn flush(&self) -> io::Result<()> {
        self.writer.lock().flush()
    }
}

/// Keeps every line in memory; clones share the same buffer
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl Sink for MemorySink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        self.lines.lock().push(line.to_string());
        Ok(())
    }
}

/// Drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl Sink for DiscardSink {
    fn write_line(&self, _line: &str) -> io::Result<()> {
        Ok(())
    }
}

/// Receives records from loggers and writes the ones passing its level
pub struct Handler {
    name: Option<String>,
    level: RwLock<Level>,
    formatter: RwLock<Option<Formatter>>,
    sink: Box<dyn Sink>,
}

impl Handler {
    /// Create a handler with no level threshold and no formatter
    pub fn new(sink: impl Sink + 'static) -> Self {
        Self {
            name: None,
            level: RwLock::new(Level::NotSet),
            formatter: RwLock::new(None),
            sink: Box::new(sink),
        }
    }

    /// Handler writing to the standard error stream
    pub fn stderr() -> HandlerRef {
        Arc::new(Self::new(StderrSink::new()))
    }

    /// Handler capturing lines in memory, plus the sink to read them back
    pub fn memory() -> (HandlerRef, MemorySink) {
        let sink = MemorySink::new();
        (Arc::new(Self::new(sink.clone())), sink)
    }

    /// Handler appending to a file, created if missing
    pub fn file(path: &Path) -> LoggingResult<HandlerRef> {
        let file: File = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Arc::new(Self::new(WriterSink::new(file))))
    }

    /// Attach a name, used only for diagnostics
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn level(&self) -> Level {
        *self.level.read()
    }

    pub fn set_level(&self, level: Level) {
        *self.level.write() = level;
    }

    pub fn formatter(&self) -> Option<Formatter> {
        *self.formatter.read()
    }

    /// Install a formatter, or `None` to fall back to the implicit layout
    pub fn set_formatter(&self, formatter: Option<Formatter>) {
        *self.formatter.write() = formatter;
    }

    /// Render `record` the way this handler would write it
    pub fn format(&self, record: &LogRecord) -> String {
        self.formatter().unwrap_or_default().format(record)
    }

    /// Write `record` if it passes the handler's level, then flush the sink.
    ///
    /// Sink failures are reported through `tracing` and otherwise ignored:
    /// emitting a log record never fails the caller.
    pub fn handle(&self, record: &LogRecord) {
        if record.level < self.level() {
            return;
        }

        let line = self.format(record);
        if let Err(e) = self.sink.write_line(&line) {
            debug!(handler = ?self.name, error = %e, "failed to write log record");
            return;
        }
        self.flush();
    }

    pub fn flush(&self) {
        if let Err(e) = self.sink.flush() {
            debug!(handler = ?self.name, error = %e, "failed to flush handler");
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("formatter", &self.formatter())
            .finish()
    }
}
