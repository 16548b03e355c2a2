use std::sync::Arc;
use std::time::Instant;

use event_channel::EventChannel;
use tracing::debug;

use super::input::{Capabilities, CommandInput, InputHandler, Key, KeyDisposition};
use super::keys::{self, TerminalAction, TerminalKey};
use super::viewport::ViewportFitter;
use crate::config::Config;
use crate::history::HistoryStore;
use crate::session::{SessionController, TransferState};

#[derive(Debug, Clone, Default)]
struct SearchBar {
    visible: bool,
    next_from: usize,
}

/// A mounted console for one server.
///
/// Channel changes are fed through [`ConsoleView::set_channel`] and connection
/// flips through [`ConsoleView::refresh_connection`]; both tear down the previous
/// subscription before binding again.
pub struct ConsoleView {
    session: SessionController,
    input: Option<InputHandler>,
    field: CommandInput,
    channel: Option<Arc<dyn EventChannel>>,
    last_connected: bool,
    search: SearchBar,
    fitter: ViewportFitter,
}

impl ConsoleView {
    pub fn mount(
        server_id: impl Into<String>,
        capabilities: &Capabilities,
        store: Arc<dyn HistoryStore>,
        config: &Config,
    ) -> Self {
        let server_id = server_id.into();
        let input = InputHandler::for_capabilities(capabilities, server_id.clone(), store);
        Self {
            session: SessionController::with_scrollback(server_id, config.scrollback),
            input,
            field: CommandInput::default(),
            channel: None,
            last_connected: false,
            search: SearchBar::default(),
            fitter: ViewportFitter::new(config.resize_debounce),
        }
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    /// Binds to `channel`. Handing over the current instance again is a no-op
    /// unless its connected flag changed in the meantime.
    pub fn set_channel(&mut self, channel: Option<Arc<dyn EventChannel>>) {
        let same_instance = match (&self.channel, &channel) {
            (Some(current), Some(next)) => std::ptr::addr_eq(Arc::as_ptr(current), Arc::as_ptr(next)),
            (None, None) => true,
            _ => false,
        };
        self.channel = channel;
        if same_instance && self.channel_connected() == self.last_connected {
            return;
        }
        self.rebind();
    }

    /// Re-evaluates the channel's `connected` flag and rebinds when it changed.
    pub fn refresh_connection(&mut self) {
        let connected = self.channel_connected();
        if connected != self.last_connected {
            debug!(
                target: "panel::session",
                server = %self.session.server_id(),
                connected,
                "channel connection changed"
            );
            self.rebind();
        }
    }

    fn rebind(&mut self) {
        self.session.detach();
        self.last_connected = self.channel_connected();
        if let Some(channel) = self.channel.as_ref().filter(|_| self.last_connected) {
            self.session.attach(Arc::clone(channel));
        }
    }

    fn channel_connected(&self) -> bool {
        self.channel.as_ref().is_some_and(|channel| channel.connected())
    }

    pub fn set_transferring(&self, transferring: bool) {
        self.session.set_transferring(transferring);
    }

    pub fn transfer_state(&self) -> TransferState {
        self.session.transfer_state()
    }

    /// Spinner overlay is shown while there is no connected channel.
    pub fn loading(&self) -> bool {
        !self.channel_connected()
    }

    pub fn input_visible(&self) -> bool {
        self.input.is_some()
    }

    pub fn input_enabled(&self) -> bool {
        self.input.is_some() && self.channel_connected()
    }

    pub fn input_value(&self) -> &str {
        self.field.value()
    }

    pub fn type_text(&mut self, text: &str) {
        if self.input.is_some() {
            self.field.set(text);
        }
    }

    pub fn history(&self) -> &[String] {
        match &self.input {
            Some(input) => input.history(),
            None => &[],
        }
    }

    pub fn key_down(&mut self, key: Key) -> KeyDisposition {
        let Some(input) = self.input.as_mut() else {
            return KeyDisposition::Default;
        };
        input.on_key_down(key, &mut self.field, self.channel.as_deref())
    }

    /// Returns whether the platform default for `key` should proceed.
    pub fn intercept_key(&mut self, key: TerminalKey) -> bool {
        let interception = keys::intercept(key);
        match interception.action {
            TerminalAction::ShowSearch => self.search.visible = true,
            TerminalAction::HideSearch => self.search.visible = false,
            TerminalAction::CopySelection | TerminalAction::None => {}
        }
        interception.proceed
    }

    pub fn search_visible(&self) -> bool {
        self.search.visible
    }

    /// Finds the next output line containing `query`, continuing after the last hit.
    pub fn search_next(&mut self, query: &str) -> Option<usize> {
        let hit = self.session.find(query, self.search.next_from)?;
        self.search.next_from = hit + 1;
        Some(hit)
    }

    pub fn remedial_dialog_visible(&self) -> bool {
        self.session.remedial_dialog_requested()
    }

    pub fn dismiss_remedial_dialog(&self) {
        self.session.dismiss_remedial_dialog();
    }

    pub fn notify_resize(&mut self, now: Instant) {
        self.fitter.notify_resize(now);
    }

    /// `true` when the terminal should be refitted now.
    pub fn poll_fit(&mut self, now: Instant) -> bool {
        self.fitter.poll(now)
    }

    pub fn unmount(mut self) {
        self.session.detach();
    }
}

impl std::fmt::Debug for ConsoleView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleView")
            .field("session", &self.session)
            .field("input", &self.input)
            .field("connected", &self.last_connected)
            .finish()
    }
}
