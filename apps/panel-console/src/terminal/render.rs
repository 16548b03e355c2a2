use std::io::{self, IsTerminal, Write};

use crate::output::{OutputLine, OutputSink};

/// Writes rendered console lines to `W` as they are appended.
pub struct TerminalSink<W> {
    out: W,
    clear_screen: bool,
}

pub type StdoutSink = TerminalSink<io::Stdout>;

impl StdoutSink {
    pub fn stdout() -> Self {
        let out = io::stdout();
        let clear_screen = out.is_terminal();
        Self { out, clear_screen }
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, clear_screen: bool) -> Self {
        Self { out, clear_screen }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> OutputSink for TerminalSink<W> {
    fn write_line(&mut self, line: &OutputLine) {
        let out = &mut self.out;
        if let Err(err) = writeln!(out, "{}", line.render()).and_then(|_| out.flush()) {
            tracing::warn!(target: "panel::render", error = %err, "failed to write console line");
        }
    }

    fn clear(&mut self) {
        if !self.clear_screen {
            return;
        }
        let out = &mut self.out;
        if let Err(err) = write!(out, "\x1b[2J\x1b[H").and_then(|_| out.flush()) {
            tracing::warn!(target: "panel::render", error = %err, "failed to clear console");
        }
    }
}
