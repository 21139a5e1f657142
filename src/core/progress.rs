//! Progress bars that can be switched off process-wide.
//!
//! [`ProgressGate`] hands out real `indicatif` bars while enabled and
//! [`EmptyProgress`] objects while disabled. Both implement
//! [`ProgressIndicator`], so callers drive them the same way and never check
//! the gate themselves.

use crate::infrastructure::env::{EnvSource, ProcessEnv, DISABLE_PROGRESS_BARS_VAR};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

static GLOBAL: Lazy<ProgressGate> = Lazy::new(|| ProgressGate::from_env(&ProcessEnv));

/// Operations shared by real and empty progress objects
pub trait ProgressIndicator {
    fn inc(&self, delta: u64);
    fn set_position(&self, position: u64);
    fn set_length(&self, length: u64);
    fn set_message(&self, message: &str);
    /// Redraw immediately
    fn refresh(&self);
    /// Back to position zero
    fn reset(&self);
    /// Mark as complete
    fn finish(&self);
    /// Stop drawing, leaving the bar where it is
    fn close(&self);
    /// Current position; `None` for objects that track nothing
    fn position(&self) -> Option<u64>;
}

impl ProgressIndicator for ProgressBar {
    fn inc(&self, delta: u64) {
        ProgressBar::inc(self, delta);
    }

    fn set_position(&self, position: u64) {
        ProgressBar::set_position(self, position);
    }

    fn set_length(&self, length: u64) {
        ProgressBar::set_length(self, length);
    }

    fn set_message(&self, message: &str) {
        ProgressBar::set_message(self, message.to_string());
    }

    fn refresh(&self) {
        self.tick();
    }

    fn reset(&self) {
        ProgressBar::reset(self);
    }

    fn finish(&self) {
        ProgressBar::finish(self);
    }

    fn close(&self) {
        if !self.is_finished() {
            self.abandon();
        }
    }

    fn position(&self) -> Option<u64> {
        Some(ProgressBar::position(self))
    }
}

/// Progress object that accepts every call and does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyProgress;

impl ProgressIndicator for EmptyProgress {
    fn inc(&self, _delta: u64) {}

    fn set_position(&self, _position: u64) {}

    fn set_length(&self, _length: u64) {}

    fn set_message(&self, _message: &str) {}

    fn refresh(&self) {}

    fn reset(&self) {}

    fn finish(&self) {}

    fn close(&self) {}

    fn position(&self) -> Option<u64> {
        None
    }
}

/// A progress object handed out by a [`ProgressGate`].
///
/// A live bar that is dropped without being finished is closed.
pub enum Progress {
    Bar(ProgressBar),
    Empty(EmptyProgress),
}

impl Progress {
    pub fn is_empty(&self) -> bool {
        matches!(self, Progress::Empty(_))
    }

    /// The underlying indicatif bar, if any
    pub fn bar(&self) -> Option<&ProgressBar> {
        match self {
            Progress::Bar(bar) => Some(bar),
            Progress::Empty(_) => None,
        }
    }

    fn indicator(&self) -> &dyn ProgressIndicator {
        match self {
            Progress::Bar(bar) => bar,
            Progress::Empty(empty) => empty,
        }
    }

    /// Run `f` with the progress object, then close it
    pub fn scope<R>(self, f: impl FnOnce(&Progress) -> R) -> R {
        let result = f(&self);
        self.close();
        result
    }
}

impl ProgressIndicator for Progress {
    fn inc(&self, delta: u64) {
        self.indicator().inc(delta);
    }

    fn set_position(&self, position: u64) {
        self.indicator().set_position(position);
    }

    fn set_length(&self, length: u64) {
        self.indicator().set_length(length);
    }

    fn set_message(&self, message: &str) {
        self.indicator().set_message(message);
    }

    fn refresh(&self) {
        self.indicator().refresh();
    }

    fn reset(&self) {
        self.indicator().reset();
    }

    fn finish(&self) {
        self.indicator().finish();
    }

    fn close(&self) {
        self.indicator().close();
    }

    fn position(&self) -> Option<u64> {
        self.indicator().position()
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Bar(bar) => f
                .debug_struct("Bar")
                .field("position", &bar.position())
                .field("length", &bar.length())
                .finish(),
            Progress::Empty(_) => f.write_str("Empty"),
        }
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.close();
    }
}

/// Iterator adapter that advances a progress object once per item and
/// finishes it when the inner iterator is exhausted
pub struct ProgressIter<I> {
    inner: I,
    progress: Progress,
}

impl<I> ProgressIter<I> {
    pub fn progress(&self) -> &Progress {
        &self.progress
    }
}

impl<I: Iterator> Iterator for ProgressIter<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next() {
            Some(item) => {
                self.progress.inc(1);
                Some(item)
            }
            None => {
                self.progress.finish();
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Switch deciding whether progress bars are shown
pub struct ProgressGate {
    enabled: AtomicBool,
    lock: Mutex<Option<MultiProgress>>,
}

impl ProgressGate {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            lock: Mutex::new(None),
        }
    }

    /// Enabled unless `HF_HUB_DISABLE_PROGRESS_BARS` is truthy
    pub fn from_env(env: &dyn EnvSource) -> Self {
        Self::new(!env.is_true(DISABLE_PROGRESS_BARS_VAR))
    }

    /// The process-wide gate, initialized from the real environment on
    /// first use
    pub fn global() -> &'static ProgressGate {
        &GLOBAL
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
        if let Some(multi) = self.lock.lock().as_ref() {
            multi.set_draw_target(ProgressDrawTarget::stderr());
        }
        debug!("progress bars enabled");
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        if let Some(multi) = self.lock.lock().as_ref() {
            multi.set_draw_target(ProgressDrawTarget::hidden());
        }
        debug!("progress bars disabled");
    }

    /// New progress object; a bar with `len` steps, or a spinner when the
    /// length is unknown
    pub fn progress(&self, len: Option<u64>) -> Progress {
        if !self.is_enabled() {
            return Progress::Empty(EmptyProgress);
        }

        let bar = match len {
            Some(len) => {
                let bar = ProgressBar::new(len);
                bar.set_style(bar_style());
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(spinner_style());
                bar
            }
        };

        match self.lock.lock().as_ref() {
            Some(multi) => Progress::Bar(multi.add(bar)),
            None => Progress::Bar(bar),
        }
    }

    /// Wrap an iterator; its length is taken from an exact size hint
    pub fn wrap<I: IntoIterator>(&self, iter: I) -> ProgressIter<I::IntoIter> {
        let inner = iter.into_iter();
        let len = match inner.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(lower as u64),
            _ => None,
        };
        ProgressIter {
            progress: self.progress(len),
            inner,
        }
    }

    /// Share one draw target between all bars created from now on. Ignored
    /// while progress bars are disabled.
    pub fn set_lock(&self, multi: MultiProgress) {
        if self.is_enabled() {
            *self.lock.lock() = Some(multi);
        }
    }

    /// Shared draw target, only while progress bars are enabled
    pub fn get_lock(&self) -> Option<MultiProgress> {
        if !self.is_enabled() {
            return None;
        }
        self.lock.lock().clone()
    }
}

impl fmt::Debug for ProgressGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressGate")
            .field("enabled", &self.is_enabled())
            .field("shared_target", &self.lock.lock().is_some())
            .finish()
    }
}

impl Default for ProgressGate {
    fn default() -> Self {
        Self::new(true)
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg} {percent:>3}%|{bar:40.cyan/blue}| {pos}/{len} [{elapsed_precise}<{eta_precise}]")
        .unwrap_or_else(|e| {
            debug!(error = %e, "invalid progress bar template");
            ProgressStyle::default_bar()
        })
        .progress_chars("█▉▊▋▌▍▎▏ ")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg} {pos} [{elapsed_precise}]")
        .unwrap_or_else(|e| {
            debug!(error = %e, "invalid spinner template");
            ProgressStyle::default_spinner()
        })
}

/// Extension trait to wrap any iterator with the process-wide gate
pub trait ProgressIteratorExt: IntoIterator + Sized {
    fn with_progress(self) -> ProgressIter<Self::IntoIter> {
        ProgressGate::global().wrap(self)
    }
}

impl<I: IntoIterator> ProgressIteratorExt for I {}

pub fn is_progress_bar_enabled() -> bool {
    ProgressGate::global().is_enabled()
}

pub fn enable_progress_bar() {
    ProgressGate::global().enable();
}

pub fn disable_progress_bar() {
    ProgressGate::global().disable();
}

/// Progress object from the process-wide gate
pub fn progress(len: Option<u64>) -> Progress {
    ProgressGate::global().progress(len)
}

/// Wrap an iterator with the process-wide gate
pub fn progress_iter<I: IntoIterator>(iter: I) -> ProgressIter<I::IntoIter> {
    ProgressGate::global().wrap(iter)
}

pub fn set_lock(multi: MultiProgress) {
    ProgressGate::global().set_lock(multi);
}

pub fn get_lock() -> Option<MultiProgress> {
    ProgressGate::global().get_lock()
}
