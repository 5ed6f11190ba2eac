use eyre::Context;
use log::{LevelFilter, Log};

use super::{formatters::PrettyFormatter, LogSink, Priority};

/// Target used by this crate for its own diagnostics.
pub const DIAGNOSTIC_TARGET: &str = "prettylog";

/// Routes `log` facade records through a [`PrettyFormatter`].
///
/// Records carrying [`DIAGNOSTIC_TARGET`] skip the formatter and go straight
/// to the fallback sink, so a failing disk sink never reports into itself.
pub struct Logger {
    filter: LevelFilter,
    formatter: PrettyFormatter,
    fallback: Box<dyn LogSink>,
}

impl Logger {
    pub fn new(filter: LevelFilter, formatter: PrettyFormatter, fallback: Box<dyn LogSink>) -> Self {
        Self {
            filter,
            formatter,
            fallback,
        }
    }

    pub fn init(self) -> eyre::Result<()> {
        log::set_max_level(self.filter);
        log::set_boxed_logger(Box::new(self)).context("Failed registering boxed logger")?;

        Ok(())
    }

    fn is_diagnostic(target: &str) -> bool {
        target == DIAGNOSTIC_TARGET || target.starts_with("prettylog::")
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.filter >= metadata.level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let priority = Priority::from(record.level());
        let message = record.args().to_string();

        if Self::is_diagnostic(record.target()) {
            self.fallback.log(priority, Some(record.target()), &message);
            return;
        }

        let tag = record.target().rsplit("::").next();
        self.formatter.log(priority, tag, &message);
    }

    fn flush(&self) {}
}
