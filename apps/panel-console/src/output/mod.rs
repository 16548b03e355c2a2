//! Line-oriented buffer that backs the console terminal.

use std::collections::VecDeque;

pub const PRELUDE: &str = "\u{1b}[1m\u{1b}[33mcontainer@iceline~ \u{1b}[0m";
pub const ERROR_MARKER: &str = "\u{1b}[1m\u{1b}[41m";
pub const RESET: &str = "\u{1b}[0m";

pub const DEFAULT_SCROLLBACK: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Agent output written as-is.
    Raw,
    /// Operator-injected status line.
    Prelude,
    /// Agent-reported error, rendered with the error marker.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub seq: u64,
    pub kind: LineKind,
    pub text: String,
}

impl OutputLine {
    pub fn prelude(&self) -> bool {
        !matches!(self.kind, LineKind::Raw)
    }

    pub fn render(&self) -> String {
        match self.kind {
            LineKind::Raw => format!("{}{RESET}", self.text),
            LineKind::Prelude => format!("{PRELUDE}{}{RESET}", self.text),
            LineKind::Error => format!("{PRELUDE}{ERROR_MARKER}{}{RESET}", self.text),
        }
    }
}

/// Receives writes as they happen, e.g. a stdout renderer.
pub trait OutputSink: Send {
    fn write_line(&mut self, line: &OutputLine);
    fn clear(&mut self);
}

/// Strips a single trailing CRLF, CR or LF.
pub fn normalize_line(raw: &str) -> &str {
    raw.strip_suffix("\r\n")
        .or_else(|| raw.strip_suffix('\n'))
        .or_else(|| raw.strip_suffix('\r'))
        .unwrap_or(raw)
}

pub struct OutputBuffer {
    lines: VecDeque<OutputLine>,
    next_seq: u64,
    scrollback: usize,
    sink: Option<Box<dyn OutputSink>>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::with_scrollback(DEFAULT_SCROLLBACK)
    }

    pub fn with_scrollback(scrollback: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            next_seq: 0,
            scrollback: scrollback.max(1),
            sink: None,
        }
    }

    pub fn set_sink(&mut self, sink: Box<dyn OutputSink>) {
        self.sink = Some(sink);
    }

    pub fn append(&mut self, kind: LineKind, raw: &str) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        let line = OutputLine {
            seq,
            kind,
            text: normalize_line(raw).to_string(),
        };
        if let Some(sink) = self.sink.as_mut() {
            sink.write_line(&line);
        }
        self.lines.push_back(line);
        while self.lines.len() > self.scrollback {
            self.lines.pop_front();
        }
        seq
    }

    /// Drops retained lines. Sequence numbers keep counting.
    pub fn clear(&mut self) {
        self.lines.clear();
        if let Some(sink) = self.sink.as_mut() {
            sink.clear();
        }
    }

    pub fn lines(&self) -> impl ExactSizeIterator<Item = &OutputLine> {
        self.lines.iter()
    }

    pub fn texts(&self) -> Vec<String> {
        self.lines.iter().map(|line| line.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index of the next retained line at or after `from` containing `query`,
    /// wrapping around to the start.
    pub fn find(&self, query: &str, from: usize) -> Option<usize> {
        if query.is_empty() || self.lines.is_empty() {
            return None;
        }
        let len = self.lines.len();
        let start = from % len;
        (0..len)
            .map(|offset| (start + offset) % len)
            .find(|&idx| self.lines[idx].text.contains(query))
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OutputBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputBuffer")
            .field("lines", &self.lines.len())
            .field("next_seq", &self.next_seq)
            .field("scrollback", &self.scrollback)
            .finish()
    }
}
