use std::path::Path;

/// Scanning starts here; frame zero always belongs to the capture machinery.
pub const MIN_STACK_OFFSET: usize = 1;

const CRATE_PREFIX: &str = concat!(env!("CARGO_CRATE_NAME"), "::");

/// One level of the call stack as it gets printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    pub declaring_type_name: String,
    pub method_name: String,
    pub file_name: String,
    pub line_number: u32,
}

impl CapturedFrame {
    pub fn new(
        declaring_type_name: impl Into<String>,
        method_name: impl Into<String>,
        file_name: impl Into<String>,
        line_number: u32,
    ) -> Self {
        Self {
            declaring_type_name: declaring_type_name.into(),
            method_name: method_name.into(),
            file_name: file_name.into(),
            line_number,
        }
    }

    /// Builds a frame from a demangled symbol such as
    /// `<app::Foo as app::Bar>::call::h0123456789abcdef`.
    pub fn from_symbol(symbol: &str, file_name: impl Into<String>, line_number: u32) -> Self {
        let (declaring_type_name, method_name) = split_path(strip_hash(symbol));
        Self::new(declaring_type_name, method_name, file_name, line_number)
    }

    /// Last path segment of the declaring type, `Foo` for `<app::Foo as app::Bar>`.
    pub fn simple_type_name(&self) -> &str {
        let name = self.declaring_type_name.trim_start_matches('<');
        let name = name.split(" as ").next().unwrap_or(name);
        split_path(name).1
    }
}

/// Splits `a::b::c` into `("a::b", "c")`, ignoring separators nested in `<...>`.
fn split_path(symbol: &str) -> (&str, &str) {
    let bytes = symbol.as_bytes();
    let mut depth = 0usize;
    let mut split = None;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' if i > 0 && bytes[i - 1] == b'-' => {}
            b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                split = Some(i);
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }

    match split {
        Some(at) => (&symbol[..at], &symbol[at + 2..]),
        None => ("", symbol),
    }
}

fn strip_hash(symbol: &str) -> &str {
    match symbol.rfind("::h") {
        Some(at)
            if symbol.len() - at == 19
                && symbol[at + 3..].chars().all(|c| c.is_ascii_hexdigit()) =>
        {
            &symbol[..at]
        }
        _ => symbol,
    }
}

/// Source of the current call stack, shallowest frame first.
pub trait CallStack: Send + Sync {
    fn capture(&self) -> Vec<CapturedFrame>;
}

/// Resolves the live stack through the `backtrace` crate. Inlined functions
/// show up as frames of their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct BacktraceCallStack;

impl CallStack for BacktraceCallStack {
    fn capture(&self) -> Vec<CapturedFrame> {
        let mut frames = Vec::new();

        backtrace::trace(|frame| {
            let before = frames.len();
            backtrace::resolve_frame(frame, |symbol| {
                let name = symbol
                    .name()
                    .map(|name| format!("{:#}", name))
                    .unwrap_or_default();
                let file_name = symbol
                    .filename()
                    .and_then(Path::file_name)
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "<unknown>".to_string());
                let line_number = symbol.lineno().unwrap_or(0);

                frames.push(CapturedFrame::from_symbol(&name, file_name, line_number));
            });

            if frames.len() == before {
                frames.push(CapturedFrame::new("", "<unknown>", "<unknown>", 0));
            }
            true
        });

        // Whatever the unwinder reports above `capture` itself is noise.
        if let Some(own) = frames
            .iter()
            .rposition(|f| f.declaring_type_name.contains("BacktraceCallStack"))
        {
            frames.drain(..own);
        }

        frames
    }
}

/// Locates the boundary between the logging library's own frames and the
/// caller's.
#[derive(Debug, Clone)]
pub struct StackContextExtractor {
    min_depth: usize,
    internal_prefixes: Vec<String>,
}

impl Default for StackContextExtractor {
    fn default() -> Self {
        Self::new(
            MIN_STACK_OFFSET,
            vec![
                CRATE_PREFIX.to_string(),
                "backtrace::".to_string(),
                "log::".to_string(),
            ],
        )
    }
}

impl StackContextExtractor {
    pub fn new(min_depth: usize, internal_prefixes: Vec<String>) -> Self {
        Self {
            min_depth,
            internal_prefixes,
        }
    }

    pub fn with_internal_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.internal_prefixes.push(prefix.into());
        self
    }

    /// A `<Type as Trait>` frame is internal when either side is.
    pub fn is_internal(&self, frame: &CapturedFrame) -> bool {
        let path = frame.declaring_type_name.trim_start_matches('<');
        if path.is_empty() {
            return true;
        }

        let (self_type, trait_path) = match path.split_once(" as ") {
            Some((self_type, trait_path)) => (self_type, Some(trait_path)),
            None => (path, None),
        };
        self.internal_prefixes.iter().any(|prefix| {
            matches_prefix(self_type, prefix)
                || trait_path.is_some_and(|t| matches_prefix(t, prefix))
        })
    }

    /// Index just before the first external frame, so that `offset + 1` is the
    /// caller. `None` when every scanned frame is internal.
    pub fn offset(&self, frames: &[CapturedFrame]) -> Option<usize> {
        frames
            .iter()
            .enumerate()
            .skip(self.min_depth)
            .find(|(_, frame)| !self.is_internal(frame))
            .and_then(|(index, _)| index.checked_sub(1))
    }
}

/// `prefix` is a module path such as `app::`; free functions at the root of
/// that module declare the bare path `app`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    path.starts_with(prefix) || path == prefix.trim_end_matches("::")
}
