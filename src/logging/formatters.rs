use core::fmt;
use std::{sync::Arc, thread};

use super::{
    callstack::{BacktraceCallStack, CallStack, CapturedFrame, StackContextExtractor},
    sinks::ConsoleSink,
    LogSink, Priority,
};

/// Largest body, in bytes, emitted in a single sink call. Stays under the
/// ~4076 byte logcat entry limit.
pub const CHUNK_SIZE: usize = 4000;

pub const DEFAULT_TAG: &str = "PRETTY_LOGGER";

const TOP_LEFT_CORNER: char = '┌';
const BOTTOM_LEFT_CORNER: char = '└';
const MIDDLE_CORNER: char = '├';
const HORIZONTAL_LINE: char = '│';
const DOUBLE_DIVIDER: &str = "────────────────────────────────────────────────────────";
const SINGLE_DIVIDER: &str = "┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄";
const NEW_LINE: char = '\n';

#[derive(Clone)]
pub struct FormatterConfig {
    /// Number of caller frames printed above the message.
    pub method_count: usize,
    /// Extra frames skipped past the computed caller boundary.
    pub method_offset: usize,
    pub show_thread_info: bool,
    pub tag: Option<String>,
    pub sink: Arc<dyn LogSink>,
}

impl FormatterConfig {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            method_count: 2,
            method_offset: 0,
            show_thread_info: true,
            tag: Some(DEFAULT_TAG.to_string()),
            sink,
        }
    }
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self::new(Arc::new(ConsoleSink::new()))
    }
}

impl fmt::Debug for FormatterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterConfig")
            .field("method_count", &self.method_count)
            .field("method_offset", &self.method_offset)
            .field("show_thread_info", &self.show_thread_info)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// Draws borders around a message, adds thread and call-site information and
/// hands the result to the configured sink.
///
/// ```text
///  ┌──────────────────────────
///  │ Thread information
///  ├┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄
///  │ Method stack history
///  ├┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄
///  │ Log message
///  └──────────────────────────
/// ```
///
/// Messages longer than [`CHUNK_SIZE`] bytes are split on raw byte
/// boundaries and each piece is emitted as its own block with an identical
/// header. A multi-byte character that straddles a boundary is decoded
/// lossily on both sides.
pub struct PrettyFormatter {
    config: FormatterConfig,
    call_stack: Box<dyn CallStack>,
    extractor: StackContextExtractor,
}

impl PrettyFormatter {
    pub fn new(config: FormatterConfig) -> Self {
        Self::with_call_stack(
            config,
            Box::new(BacktraceCallStack),
            StackContextExtractor::default(),
        )
    }

    pub fn with_call_stack(
        config: FormatterConfig,
        call_stack: Box<dyn CallStack>,
        extractor: StackContextExtractor,
    ) -> Self {
        Self {
            config,
            call_stack,
            extractor,
        }
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    pub fn format_tag(&self, once_only_tag: Option<&str>) -> Option<String> {
        match (once_only_tag, self.config.tag.as_deref()) {
            (Some(tag), Some(default)) if !tag.is_empty() && tag != default => {
                Some(format!("{}-{}", default, tag))
            }
            (Some(tag), None) if !tag.is_empty() => Some(tag.to_string()),
            (_, default) => default.map(str::to_string),
        }
    }

    fn header(&self) -> String {
        let mut header = String::new();
        push_line(&mut header, &top_border());

        if self.config.show_thread_info {
            let current = thread::current();
            let name = current
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{:?}", current.id()));
            push_line(&mut header, &format!("{} Thread: {}", HORIZONTAL_LINE, name));
            push_line(&mut header, &middle_border());
        }

        if self.config.method_count > 0 {
            let frames = self.call_stack.capture();
            for line in self.frame_lines(&frames) {
                push_line(&mut header, &line);
            }
            push_line(&mut header, &middle_border());
        }

        header
    }

    /// Up to `method_count` frame lines, most distant caller first.
    fn frame_lines(&self, frames: &[CapturedFrame]) -> Vec<String> {
        let Some(offset) = self.extractor.offset(frames) else {
            return Vec::new();
        };
        let stack_offset = offset.saturating_add(self.config.method_offset);

        // The requested count may run past the end of the captured stack.
        let available = frames.len().saturating_sub(stack_offset.saturating_add(1));
        let method_count = self.config.method_count.min(available);

        (1..=method_count)
            .rev()
            .map(|i| {
                let frame = &frames[stack_offset + i];
                let level = "   ".repeat(i - 1);
                format!(
                    "{} {}{}.{}  ({}:{})",
                    HORIZONTAL_LINE,
                    level,
                    frame.simple_type_name(),
                    frame.method_name,
                    frame.file_name,
                    frame.line_number
                )
            })
            .collect()
    }

    pub fn log(&self, priority: Priority, tag: Option<&str>, message: &str) {
        let tag = self.format_tag(tag);
        let header = self.header();
        let bytes = message.as_bytes();

        if bytes.len() <= CHUNK_SIZE {
            self.emit(priority, tag.as_deref(), &header, message);
            return;
        }

        for chunk in bytes.chunks(CHUNK_SIZE) {
            self.emit(
                priority,
                tag.as_deref(),
                &header,
                &String::from_utf8_lossy(chunk),
            );
        }
    }

    fn emit(&self, priority: Priority, tag: Option<&str>, header: &str, content: &str) {
        let mut block = String::with_capacity(header.len() + content.len());
        block.push_str(header);
        for line in content.lines() {
            push_line(&mut block, &format!("{} {}", HORIZONTAL_LINE, line));
        }
        push_line(&mut block, &bottom_border());

        self.config.sink.log(priority, tag, &block);
    }
}

impl LogSink for PrettyFormatter {
    fn log(&self, priority: Priority, tag: Option<&str>, message: &str) {
        PrettyFormatter::log(self, priority, tag, message)
    }
}

fn push_line(buffer: &mut String, line: &str) {
    buffer.push_str(line);
    buffer.push(NEW_LINE);
}

fn top_border() -> String {
    format!("{}{}{}", TOP_LEFT_CORNER, DOUBLE_DIVIDER, DOUBLE_DIVIDER)
}

fn bottom_border() -> String {
    format!("{}{}{}", BOTTOM_LEFT_CORNER, DOUBLE_DIVIDER, DOUBLE_DIVIDER)
}

fn middle_border() -> String {
    format!("{}{}{}", MIDDLE_CORNER, SINGLE_DIVIDER, SINGLE_DIVIDER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;

    struct FixedCallStack(Vec<CapturedFrame>);

    impl CallStack for FixedCallStack {
        fn capture(&self) -> Vec<CapturedFrame> {
            self.0.clone()
        }
    }

    fn fixed_stack() -> Vec<CapturedFrame> {
        vec![
            CapturedFrame::new("backtrace", "trace", "lib.rs", 1),
            CapturedFrame::new("lib::Printer", "log", "printer.rs", 10),
            CapturedFrame::new("app::Handler", "handle", "handler.rs", 20),
            CapturedFrame::new("app::Router", "route", "router.rs", 30),
            CapturedFrame::new("app::Server", "serve", "server.rs", 40),
        ]
    }

    fn formatter(config: FormatterConfig) -> PrettyFormatter {
        PrettyFormatter::with_call_stack(
            config,
            Box::new(FixedCallStack(fixed_stack())),
            StackContextExtractor::new(1, vec!["backtrace".to_string(), "lib::".to_string()]),
        )
    }

    fn config(sink: &MemorySink) -> FormatterConfig {
        FormatterConfig::new(Arc::new(sink.clone()))
    }

    #[test]
    fn defaults() {
        let config = FormatterConfig::default();
        assert_eq!(config.method_count, 2);
        assert_eq!(config.method_offset, 0);
        assert!(config.show_thread_info);
        assert_eq!(config.tag.as_deref(), Some(DEFAULT_TAG));
    }

    #[test]
    fn merges_tags() {
        let sink = MemorySink::new();
        let f = formatter(config(&sink));

        assert_eq!(f.format_tag(Some("Net")).as_deref(), Some("PRETTY_LOGGER-Net"));
        assert_eq!(f.format_tag(Some("PRETTY_LOGGER")).as_deref(), Some("PRETTY_LOGGER"));
        assert_eq!(f.format_tag(Some("")).as_deref(), Some("PRETTY_LOGGER"));
        assert_eq!(f.format_tag(None).as_deref(), Some("PRETTY_LOGGER"));
    }

    #[test]
    fn tag_without_default() {
        let sink = MemorySink::new();
        let f = formatter(FormatterConfig {
            tag: None,
            ..config(&sink)
        });

        assert_eq!(f.format_tag(Some("Net")).as_deref(), Some("Net"));
        assert_eq!(f.format_tag(None), None);
    }

    #[test]
    fn single_block_layout() {
        let sink = MemorySink::new();
        let f = formatter(FormatterConfig {
            show_thread_info: false,
            ..config(&sink)
        });

        f.log(Priority::INFO, Some("Net"), "hello\nworld");

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tag.as_deref(), Some("PRETTY_LOGGER-Net"));
        assert_eq!(records[0].priority, Priority::INFO);

        let expected = [
            top_border(),
            "│    Router.route  (router.rs:30)".to_string(),
            "│ Handler.handle  (handler.rs:20)".to_string(),
            middle_border(),
            "│ hello".to_string(),
            "│ world".to_string(),
            bottom_border(),
        ]
        .map(|line| line + "\n")
        .concat();
        assert_eq!(records[0].message, expected);
    }

    #[test]
    fn thread_info_appears_once_before_frames() {
        let sink = MemorySink::new();
        let f = formatter(config(&sink));

        thread::Builder::new()
            .name("worker-7".to_string())
            .spawn(move || f.log(Priority::DEBUG, None, "x"))
            .unwrap()
            .join()
            .unwrap();

        let message = &sink.messages()[0];
        let lines: Vec<&str> = message.lines().collect();
        assert_eq!(message.matches("Thread:").count(), 1);
        assert_eq!(lines[1], "│ Thread: worker-7");
        assert_eq!(lines[2], middle_border());
        assert!(lines[3].contains("Router.route"));
    }

    #[test]
    fn no_thread_line_when_disabled() {
        let sink = MemorySink::new();
        let f = formatter(FormatterConfig {
            show_thread_info: false,
            ..config(&sink)
        });

        f.log(Priority::DEBUG, None, "x");
        assert!(!sink.messages()[0].contains("Thread:"));
    }

    #[test]
    fn method_count_zero_has_no_frames_or_divider() {
        let sink = MemorySink::new();
        let f = formatter(FormatterConfig {
            method_count: 0,
            show_thread_info: false,
            ..config(&sink)
        });

        f.log(Priority::WARN, None, "only");

        let expected = format!("{}\n│ only\n{}\n", top_border(), bottom_border());
        assert_eq!(sink.messages(), vec![expected]);
    }

    #[test]
    fn empty_message_has_no_content_lines() {
        let sink = MemorySink::new();
        let f = formatter(FormatterConfig {
            method_count: 0,
            show_thread_info: false,
            ..config(&sink)
        });

        f.log(Priority::INFO, None, "");

        assert_eq!(
            sink.messages(),
            vec![format!("{}\n{}\n", top_border(), bottom_border())]
        );
    }

    #[test]
    fn method_offset_and_clipping() {
        let sink = MemorySink::new();
        let f = formatter(FormatterConfig {
            method_count: 10,
            method_offset: 1,
            show_thread_info: false,
            ..config(&sink)
        });

        f.log(Priority::INFO, None, "x");

        let message = &sink.messages()[0];
        let lines: Vec<&str> = message.lines().collect();
        // offset 1 + method_offset 1 leaves Router and Server.
        assert_eq!(lines[1], "│    Server.serve  (server.rs:40)");
        assert_eq!(lines[2], "│ Router.route  (router.rs:30)");
        assert_eq!(lines[3], middle_border());
        assert!(!message.contains("Handler"));
    }

    #[test]
    fn offset_past_stack_prints_no_frames() {
        let sink = MemorySink::new();
        let f = formatter(FormatterConfig {
            method_offset: 50,
            show_thread_info: false,
            ..config(&sink)
        });

        f.log(Priority::INFO, None, "x");

        let lines: Vec<String> = sink.messages()[0].lines().map(str::to_string).collect();
        assert_eq!(lines, vec![top_border(), middle_border(), "│ x".to_string(), bottom_border()]);
    }

    #[test]
    fn huge_method_offset_prints_no_frames() {
        let sink = MemorySink::new();
        let f = formatter(FormatterConfig {
            method_count: usize::MAX,
            method_offset: usize::MAX,
            show_thread_info: false,
            ..config(&sink)
        });

        f.log(Priority::INFO, None, "x");

        let lines: Vec<String> = sink.messages()[0].lines().map(str::to_string).collect();
        assert_eq!(lines, vec![top_border(), middle_border(), "│ x".to_string(), bottom_border()]);
    }

    #[test]
    fn unknown_caller_omits_frames() {
        let sink = MemorySink::new();
        let f = PrettyFormatter::with_call_stack(
            FormatterConfig {
                show_thread_info: false,
                ..config(&sink)
            },
            Box::new(FixedCallStack(fixed_stack())),
            StackContextExtractor::new(1, vec!["".to_string()]),
        );

        f.log(Priority::INFO, None, "x");
        assert_eq!(sink.messages()[0].lines().count(), 4);
    }

    #[test]
    fn boundary_message_is_one_chunk() {
        let sink = MemorySink::new();
        let f = formatter(FormatterConfig {
            method_count: 0,
            ..config(&sink)
        });

        f.log(Priority::INFO, None, &"a".repeat(CHUNK_SIZE));
        assert_eq!(sink.records().len(), 1);

        sink.clear();
        f.log(Priority::INFO, None, &"a".repeat(CHUNK_SIZE + 1));
        assert_eq!(sink.records().len(), 2);
    }

    #[test]
    fn chunks_share_header_and_reassemble() {
        let sink = MemorySink::new();
        let f = formatter(config(&sink));
        let message: String = (0..9_500u32)
            .map(|i| char::from(b'a' + (i % 26) as u8))
            .collect();

        f.log(Priority::ERROR, Some("Big"), &message);

        let records = sink.records();
        assert_eq!(records.len(), 3);

        let header_of = |block: &str| {
            let lines: Vec<&str> = block.lines().collect();
            lines[..lines.len() - 2].join("\n")
        };
        let header = header_of(&records[0].message);
        let mut reassembled = String::new();
        for record in &records {
            assert_eq!(record.tag.as_deref(), Some("PRETTY_LOGGER-Big"));
            assert_eq!(header_of(&record.message), header);
            assert!(record.message.ends_with(&format!("{}\n", bottom_border())));

            let lines: Vec<&str> = record.message.lines().collect();
            let content = lines[lines.len() - 2].strip_prefix("│ ").unwrap();
            reassembled.push_str(content);
        }
        assert_eq!(reassembled, message);
    }

    #[test]
    fn multi_byte_split_is_lossy() {
        let sink = MemorySink::new();
        let f = formatter(FormatterConfig {
            method_count: 0,
            show_thread_info: false,
            ..config(&sink)
        });
        // 3999 ASCII bytes put the three-byte '€' across the boundary.
        let message = format!("{}€", "a".repeat(CHUNK_SIZE - 1));

        f.log(Priority::INFO, None, &message);

        let messages = sink.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains('\u{FFFD}'));
        assert!(messages[1].contains('\u{FFFD}'));
    }
}
