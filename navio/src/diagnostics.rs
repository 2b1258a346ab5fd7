//! Injected logging capability for configuration diagnostics.
//!
//! ## Usage
//!
//! Pass a [`LogSink`] to [`crate::Navio::with_log_sink`]; the default sink
//! forwards everything to `tracing` under the `navio` target.

use std::{fmt, sync::Arc};

use parking_lot::Mutex;
use tracing::{error, info, warn};

/// Severity of a diagnostic.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Informational; nothing is broken.
    Info,
    /// A configuration problem that was recovered from.
    Warn,
    /// Something failed at runtime, e.g. a panicking listener.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        })
    }
}

/// Receives diagnostics emitted while resolving layouts and dispatching actions.
pub trait LogSink: Send + Sync + 'static {
    /// Record one message.
    fn log(&self, level: LogLevel, message: &str);
}

/// Default sink, forwarding to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => info!(target: "navio", "[navio] {message}"),
            LogLevel::Warn => warn!(target: "navio", "[navio] {message}"),
            LogLevel::Error => error!(target: "navio", "[navio] {message}"),
        }
    }
}

/// Sink that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _level: LogLevel, _message: &str) {}
}

/// Sink that keeps every message in memory.
///
/// Useful in tests and for hosts that surface diagnostics in a dev overlay.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(LogLevel, String)>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded messages, oldest first.
    pub fn records(&self) -> Vec<(LogLevel, String)> {
        self.records.lock().clone()
    }

    /// Whether a message at `level` containing `needle` was recorded.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records
            .lock()
            .iter()
            .any(|(l, message)| *l == level && message.contains(needle))
    }

    /// Number of recorded messages.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: LogLevel, message: &str) {
        self.records.lock().push((level, message.to_owned()));
    }
}

#[derive(Clone)]
pub(crate) struct Diagnostics {
    sink: Arc<dyn LogSink>,
}

impl Diagnostics {
    pub(crate) fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    pub(crate) fn info(&self, message: impl AsRef<str>) {
        self.sink.log(LogLevel::Info, message.as_ref());
    }

    pub(crate) fn warn(&self, message: impl AsRef<str>) {
        self.sink.log(LogLevel::Warn, message.as_ref());
    }

    pub(crate) fn error(&self, message: impl AsRef<str>) {
        self.sink.log(LogLevel::Error, message.as_ref());
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}
