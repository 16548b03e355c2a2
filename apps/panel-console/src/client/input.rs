use std::collections::HashSet;
use std::sync::Arc;

use event_channel::EventChannel;
use tracing::{debug, warn};

use crate::history::HistoryStore;
use crate::session::OutboundEvent;

/// Capability required to send console commands.
pub const CONSOLE_CONTROL: &str = "control.console";

/// Capabilities granted to the current user, as reported by the authorization service.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    granted: HashSet<String>,
}

impl Capabilities {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, capability: impl Into<String>) {
        self.granted.insert(capability.into());
    }

    pub fn allows(&self, capability: &str) -> bool {
        self.granted.contains(capability)
    }
}

impl<S: Into<String>> FromIterator<S> for Capabilities {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            granted: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Enter,
    Other,
}

/// Whether the platform's default handling of a key should still run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    Default,
    PreventDefault,
}

/// Text of the command input line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandInput {
    value: String,
}

impl CommandInput {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Keyboard handling for the command line: history browsing and submission.
pub struct InputHandler {
    server_id: String,
    store: Arc<dyn HistoryStore>,
    history: Vec<String>,
    cursor: isize,
}

impl InputHandler {
    /// Builds a handler only for users allowed to control the console.
    pub fn for_capabilities(
        capabilities: &Capabilities,
        server_id: impl Into<String>,
        store: Arc<dyn HistoryStore>,
    ) -> Option<Self> {
        if !capabilities.allows(CONSOLE_CONTROL) {
            return None;
        }
        let server_id = server_id.into();
        let history = store.read(&server_id);
        Some(Self {
            server_id,
            store,
            history,
            cursor: -1,
        })
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// `-1` when not browsing history.
    pub fn cursor(&self) -> isize {
        self.cursor
    }

    pub fn on_key_down(
        &mut self,
        key: Key,
        input: &mut CommandInput,
        channel: Option<&dyn EventChannel>,
    ) -> KeyDisposition {
        match key {
            Key::ArrowUp => {
                self.previous(input);
                // Keep the caret at the end of the recalled command.
                KeyDisposition::PreventDefault
            }
            Key::ArrowDown => {
                self.next(input);
                KeyDisposition::Default
            }
            Key::Enter => {
                self.submit(input, channel);
                KeyDisposition::Default
            }
            Key::Other => KeyDisposition::Default,
        }
    }

    pub fn previous(&mut self, input: &mut CommandInput) {
        let last = self.history.len() as isize - 1;
        self.cursor = (self.cursor + 1).min(last);
        input.set(self.entry_at_cursor());
    }

    pub fn next(&mut self, input: &mut CommandInput) {
        self.cursor = (self.cursor - 1).max(-1);
        input.set(self.entry_at_cursor());
    }

    /// Sends the current input as a command. Returns the command when one was sent.
    pub fn submit(
        &mut self,
        input: &mut CommandInput,
        channel: Option<&dyn EventChannel>,
    ) -> Option<String> {
        if input.is_empty() {
            return None;
        }
        let Some(channel) = channel.filter(|channel| channel.connected()) else {
            debug!(target: "panel::input", server = %self.server_id, "input disabled; dropping submit");
            return None;
        };

        let command = input.value().to_string();
        crate::history::prepend_bounded(&mut self.history, &command);
        if let Err(err) = self.store.push(&self.server_id, &command) {
            warn!(
                target: "panel::input",
                server = %self.server_id,
                error = %err,
                "failed to persist command history"
            );
        }
        self.cursor = -1;

        if let Err(err) = channel.send(OutboundEvent::SendCommand.as_str(), Some(&command)) {
            warn!(target: "panel::input", server = %self.server_id, error = %err, "failed to send command");
        }
        input.clear();
        Some(command)
    }

    fn entry_at_cursor(&self) -> String {
        usize::try_from(self.cursor)
            .ok()
            .and_then(|idx| self.history.get(idx))
            .cloned()
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for InputHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputHandler")
            .field("server_id", &self.server_id)
            .field("history", &self.history.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}
