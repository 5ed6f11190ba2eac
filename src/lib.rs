//! Bordered, call-site aware log formatting and a crash-tolerant rotating
//! disk sink.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use prettylog::{DiskConfig, DiskLogWriter, FormatterConfig, Priority, PrettyFormatter};
//!
//! # fn main() -> eyre::Result<()> {
//! let disk = Arc::new(DiskLogWriter::new(DiskConfig::new("/tmp/app-logs"))?);
//! let formatter = PrettyFormatter::new(FormatterConfig::new(disk.clone()));
//!
//! formatter.log(Priority::INFO, Some("Net"), "connected");
//! disk.shutdown()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod disk;
pub mod logging;

pub use config::{ConfigManager, DiskConfig, LocalConfigManager};
pub use disk::DiskLogWriter;
pub use logging::{
    CallStack, CapturedFrame, ConsoleSink, FanOutSink, FormatterConfig, LogRecord, LogSink,
    Logger, MemorySink, NullSink, PrettyFormatter, Priority, StackContextExtractor, CHUNK_SIZE,
    DEFAULT_TAG,
};
