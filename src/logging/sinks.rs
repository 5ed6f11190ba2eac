use std::{
    io::Write,
    sync::{Arc, Mutex},
};

use super::{LogRecord, LogSink, Priority};

/// Pass-through sink that prints every line of a message to stderr, prefixed
/// the way logcat prefixes its output.
pub struct ConsoleSink {
    handle: std::io::Stderr,
    datetime_format: String,
    use_ansi: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            handle: std::io::stderr(),
            datetime_format: "%Y-%m-%d %H:%M:%S".to_string(),
            use_ansi: true,
        }
    }

    pub fn with_ansi(self, use_ansi: bool) -> Self {
        Self { use_ansi, ..self }
    }

    fn format_level(&self, priority: Priority) -> String {
        // Scoped here: `Paint::clear` would shadow `Vec::clear` elsewhere.
        use yansi::{Color, Paint};

        let label = priority.label();
        if !self.use_ansi {
            return label;
        }

        let color = match priority {
            Priority::ERROR | Priority::ASSERT => Color::Red,
            Priority::WARN => Color::Yellow,
            Priority::INFO => Color::Green,
            Priority::DEBUG => Color::Blue,
            _ => Color::White,
        };
        label.fg(color).bold().to_string()
    }

    fn prefix(&self, priority: Priority, tag: Option<&str>) -> String {
        let time = chrono::Local::now().format(&self.datetime_format);
        format!(
            "{} {}/{}",
            time,
            self.format_level(priority),
            tag.unwrap_or_default()
        )
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for ConsoleSink {
    fn log(&self, priority: Priority, tag: Option<&str>, message: &str) {
        let prefix = self.prefix(priority, tag);
        let mut writer = self.handle.lock();

        for line in message.lines() {
            let _ = writeln!(writer, "{}: {}", prefix, line);
        }
        let _ = writer.flush();
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone)]
pub struct NullSink {}

impl NullSink {
    pub fn new() -> Self {
        Self {}
    }
}

impl LogSink for NullSink {
    fn log(&self, _priority: Priority, _tag: Option<&str>, _message: &str) {}
}

/// Forwards every call to each of its sinks, in order.
#[derive(Default, Clone)]
pub struct FanOutSink {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl FanOutSink {
    pub fn new(sinks: Vec<Arc<dyn LogSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn LogSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl LogSink for FanOutSink {
    fn log(&self, priority: Priority, tag: Option<&str>, message: &str) {
        for sink in &self.sinks {
            sink.log(priority, tag, message);
        }
    }
}

/// Keeps every call in memory. Handy for inspecting formatter output.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }
}

impl LogSink for MemorySink {
    fn log(&self, priority: Priority, tag: Option<&str>, message: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push(LogRecord::new(priority, tag, message));
        }
    }
}
