mod callstack;
mod formatters;
mod logger;
mod sinks;

use core::fmt;

pub use callstack::{BacktraceCallStack, CallStack, CapturedFrame, StackContextExtractor};
pub use formatters::{FormatterConfig, PrettyFormatter, CHUNK_SIZE, DEFAULT_TAG};
pub use logger::{Logger, DIAGNOSTIC_TARGET};
pub use sinks::{ConsoleSink, FanOutSink, MemorySink, NullSink};

/// Capability that accepts a finished log line.
///
/// Implementations must never panic or surface errors to the caller; both the
/// formatter and the disk writer are realized against this contract.
pub trait LogSink: Sync + Send {
    fn log(&self, priority: Priority, tag: Option<&str>, message: &str);
}

impl<S: LogSink + ?Sized> LogSink for std::sync::Arc<S> {
    fn log(&self, priority: Priority, tag: Option<&str>, message: &str) {
        (**self).log(priority, tag, message)
    }
}

/// Integer severity code, numbered the way Android's logcat numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i32);

impl Priority {
    pub const VERBOSE: Priority = Priority(2);
    pub const DEBUG: Priority = Priority(3);
    pub const INFO: Priority = Priority(4);
    pub const WARN: Priority = Priority(5);
    pub const ERROR: Priority = Priority(6);
    pub const ASSERT: Priority = Priority(7);

    pub fn label(&self) -> String {
        match *self {
            Priority::VERBOSE => "V".to_string(),
            Priority::DEBUG => "D".to_string(),
            Priority::INFO => "I".to_string(),
            Priority::WARN => "W".to_string(),
            Priority::ERROR => "E".to_string(),
            Priority::ASSERT => "A".to_string(),
            Priority(other) => other.to_string(),
        }
    }
}

impl From<log::Level> for Priority {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Priority::ERROR,
            log::Level::Warn => Priority::WARN,
            log::Level::Info => Priority::INFO,
            log::Level::Debug => Priority::DEBUG,
            log::Level::Trace => Priority::VERBOSE,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single `(priority, tag, message)` triple, consumed exactly once by a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub priority: Priority,
    pub tag: Option<String>,
    pub message: String,
}

impl LogRecord {
    pub fn new(priority: Priority, tag: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            priority,
            tag: tag.map(str::to_string),
            message: message.into(),
        }
    }
}
