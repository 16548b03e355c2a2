//! Live console session: binds the agent's event channel to the output buffer.

pub mod events;
mod subscription;
pub mod transfer;

pub use events::{InboundEvent, LICENSE_FAILURE_MARKER, OutboundEvent};
pub use subscription::Subscription;
pub use transfer::{TransferState, Transition};

use std::sync::{Arc, Weak};

use event_channel::{EventChannel, Handler};
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::output::{DEFAULT_SCROLLBACK, LineKind, OutputBuffer, OutputLine, OutputSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

#[derive(Debug)]
struct SessionState {
    output: OutputBuffer,
    transfer: TransferState,
    is_transferring: bool,
    remedial_dialog: bool,
    /// Bumped on every detach; handlers bound under an older value are stale.
    generation: u64,
}

impl SessionState {
    fn handle(&mut self, event: InboundEvent, payload: &str) {
        match event {
            InboundEvent::Status => {
                self.output
                    .append(LineKind::Prelude, &format!("Server marked as {payload}..."));
            }
            InboundEvent::ConsoleOutput => {
                if payload.contains(LICENSE_FAILURE_MARKER) {
                    self.remedial_dialog = true;
                }
                self.output.append(LineKind::Raw, payload);
            }
            InboundEvent::InstallOutput | InboundEvent::TransferLogs => {
                self.output.append(LineKind::Raw, payload);
            }
            InboundEvent::TransferStatus => match self.transfer.advance(payload) {
                Some(transition) => {
                    debug!(
                        target: "panel::session",
                        from = ?transition.from,
                        to = ?transition.to,
                        "transfer state changed"
                    );
                    self.output.append(LineKind::Prelude, transition.line);
                }
                None => {
                    debug!(
                        target: "panel::session",
                        status = payload,
                        state = ?self.transfer,
                        "ignoring transfer status"
                    );
                }
            },
            InboundEvent::DaemonMessage => {
                self.output.append(LineKind::Prelude, payload);
            }
            InboundEvent::DaemonError => {
                self.output.append(LineKind::Error, payload);
            }
        }
    }
}

/// Console session for one server.
///
/// At most one [`Subscription`] is live at a time: every [`attach`](Self::attach)
/// releases the previous one first, so events are never delivered twice.
pub struct SessionController {
    server_id: String,
    state: Arc<Mutex<SessionState>>,
    subscription: Option<Subscription>,
}

impl SessionController {
    pub fn new(server_id: impl Into<String>) -> Self {
        Self::with_scrollback(server_id, DEFAULT_SCROLLBACK)
    }

    pub fn with_scrollback(server_id: impl Into<String>, scrollback: usize) -> Self {
        Self {
            server_id: server_id.into(),
            state: Arc::new(Mutex::new(SessionState {
                output: OutputBuffer::with_scrollback(scrollback),
                transfer: TransferState::None,
                is_transferring: false,
                remedial_dialog: false,
                generation: 0,
            })),
            subscription: None,
        }
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    /// Subscribes to `channel` and requests the log backlog.
    ///
    /// Returns `false` without registering anything when the channel is not
    /// connected. Unless a transfer is in progress the output is cleared first.
    pub fn attach(&mut self, channel: Arc<dyn EventChannel>) -> bool {
        self.detach();
        if !channel.connected() {
            debug!(target: "panel::session", server = %self.server_id, "channel not connected; not attaching");
            return false;
        }

        let generation = {
            let mut state = self.state.lock();
            if !state.is_transferring {
                state.output.clear();
                state.transfer.reset();
            }
            state.generation
        };

        let weak = Arc::downgrade(&self.state);
        let handlers = InboundEvent::ALL
            .map(|event| (event, handler_for(Weak::clone(&weak), generation, event)));
        let subscription = Subscription::bind(Arc::clone(&channel), handlers);
        debug!(
            target: "panel::session",
            server = %self.server_id,
            listeners = subscription.listener_count(),
            "attached to event channel"
        );
        self.subscription = Some(subscription);

        if let Err(err) = channel.send(OutboundEvent::SendLogs.as_str(), None) {
            warn!(target: "panel::session", server = %self.server_id, error = %err, "failed to request logs");
        }
        true
    }

    /// Removes every listener added by the last attach. No-op when detached.
    ///
    /// Events already being dispatched to the released listeners are dropped.
    pub fn detach(&mut self) {
        self.state.lock().generation += 1;
        if let Some(subscription) = self.subscription.take() {
            let removed = subscription.release();
            debug!(target: "panel::session", server = %self.server_id, removed, "detached from event channel");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn is_attached_to(&self, channel: &Arc<dyn EventChannel>) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|subscription| subscription.is_bound_to(channel))
    }

    pub fn connection_state(&self) -> ConnectionState {
        match &self.subscription {
            Some(subscription) if subscription.channel().connected() => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }

    pub fn set_transferring(&self, transferring: bool) {
        self.state.lock().is_transferring = transferring;
    }

    pub fn is_transferring(&self) -> bool {
        self.state.lock().is_transferring
    }

    pub fn transfer_state(&self) -> TransferState {
        self.state.lock().transfer
    }

    /// Routes one inbound event by wire name. Unknown names are ignored.
    pub fn dispatch(&self, event: &str, payload: &str) -> bool {
        match InboundEvent::parse(event) {
            Some(event) => {
                self.state.lock().handle(event, payload);
                true
            }
            None => {
                trace!(target: "panel::session", event, "ignoring unrecognized event");
                false
            }
        }
    }

    pub fn remedial_dialog_requested(&self) -> bool {
        self.state.lock().remedial_dialog
    }

    pub fn dismiss_remedial_dialog(&self) {
        self.state.lock().remedial_dialog = false;
    }

    pub fn set_sink(&self, sink: Box<dyn OutputSink>) {
        self.state.lock().output.set_sink(sink);
    }

    pub fn lines(&self) -> Vec<OutputLine> {
        self.state.lock().output.lines().cloned().collect()
    }

    pub fn texts(&self) -> Vec<String> {
        self.state.lock().output.texts()
    }

    pub fn rendered(&self) -> Vec<String> {
        self.state
            .lock()
            .output
            .lines()
            .map(OutputLine::render)
            .collect()
    }

    pub fn find(&self, query: &str, from: usize) -> Option<usize> {
        self.state.lock().output.find(query, from)
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("server_id", &self.server_id)
            .field("subscription", &self.subscription)
            .finish()
    }
}

fn handler_for(state: Weak<Mutex<SessionState>>, generation: u64, event: InboundEvent) -> Handler {
    Arc::new(move |payload: &str| {
        let Some(state) = state.upgrade() else {
            return;
        };
        let mut state = state.lock();
        if state.generation != generation {
            trace!(target: "panel::session", event = event.as_str(), "dropping event for released subscription");
            return;
        }
        state.handle(event, payload);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_channel::LocalChannel;

    fn connected() -> (Arc<LocalChannel>, Arc<dyn EventChannel>) {
        let local = Arc::new(LocalChannel::new());
        let channel: Arc<dyn EventChannel> = local.clone();
        (local, channel)
    }

    #[test]
    fn status_renders_prelude_line() {
        let session = SessionController::new("srv");
        session.dispatch("status", "running");
        let lines = session.lines();
        assert_eq!(lines[0].text, "Server marked as running...");
        assert!(lines[0].prelude());
    }

    #[test]
    fn daemon_message_forces_prelude_and_error_is_marked() {
        let session = SessionController::new("srv");
        session.dispatch("daemon message", "Pulling image\n");
        session.dispatch("daemon error", "disk full\r\n");
        let lines = session.lines();
        assert_eq!(lines[0].kind, LineKind::Prelude);
        assert_eq!(lines[0].text, "Pulling image");
        assert_eq!(lines[1].kind, LineKind::Error);
        assert_eq!(lines[1].text, "disk full");
    }

    #[test]
    fn unknown_events_are_ignored() {
        let session = SessionController::new("srv");
        assert!(!session.dispatch("stats", "{}"));
        assert!(session.texts().is_empty());
    }

    #[test]
    fn license_marker_raises_dialog_flag() {
        let session = SessionController::new("srv");
        session.dispatch("console output", "[ ERROR] Could not authenticate server license key. retry");
        assert!(session.remedial_dialog_requested());
        session.dismiss_remedial_dialog();
        assert!(!session.remedial_dialog_requested());
        session.dispatch("install output", "Could not authenticate server license key");
        assert!(!session.remedial_dialog_requested());
    }

    #[test]
    fn attach_registers_one_listener_per_event_and_requests_logs() {
        let (local, channel) = connected();
        let mut tap = local.agent_tap();
        let mut session = SessionController::new("srv");
        assert!(session.attach(channel));
        assert_eq!(local.total_listeners(), InboundEvent::ALL.len());
        for event in InboundEvent::ALL {
            assert_eq!(local.listener_count(event.as_str()), 1);
        }
        let msg = tap.try_recv().expect("logs requested");
        assert_eq!(msg.event, "send logs");
        assert_eq!(msg.payload, None);
        assert_eq!(session.connection_state(), ConnectionState::Connected);
    }

    #[test]
    fn attach_skips_disconnected_channel() {
        let local = Arc::new(LocalChannel::disconnected());
        let mut session = SessionController::new("srv");
        assert!(!session.attach(local.clone()));
        assert_eq!(local.total_listeners(), 0);
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn detach_is_idempotent() {
        let (local, channel) = connected();
        let mut session = SessionController::new("srv");
        session.detach();
        session.attach(channel);
        session.detach();
        session.detach();
        assert_eq!(local.total_listeners(), 0);
        local.emit("console output", "late");
        assert!(session.texts().is_empty());
    }

    #[test]
    fn dropping_session_releases_listeners() {
        let (local, channel) = connected();
        {
            let mut session = SessionController::new("srv");
            session.attach(channel);
        }
        assert_eq!(local.total_listeners(), 0);
    }

    #[test]
    fn moving_to_a_new_channel_releases_the_old_one() {
        let (old_local, old) = connected();
        let (new_local, new) = connected();
        let mut session = SessionController::new("srv");
        session.attach(Arc::clone(&old));
        session.attach(Arc::clone(&new));
        assert_eq!(old_local.total_listeners(), 0);
        assert_eq!(new_local.total_listeners(), InboundEvent::ALL.len());
        assert!(session.is_attached_to(&new));
        assert!(!session.is_attached_to(&old));
    }

    // A listener registered ahead of the session's own detaches it while the
    // same event is being dispatched; the session's copy must not write.
    fn detaching_listener(local: &LocalChannel, session: &Arc<Mutex<SessionController>>) {
        let session = Arc::downgrade(session);
        local.add_listener(
            "console output",
            Arc::new(move |_: &str| {
                if let Some(session) = session.upgrade() {
                    session.lock().detach();
                }
            }),
        );
    }

    #[test]
    fn detach_during_dispatch_drops_in_flight_event() {
        let (local, channel) = connected();
        let session = Arc::new(Mutex::new(SessionController::new("srv")));
        detaching_listener(&local, &session);
        session.lock().attach(channel);

        assert_eq!(local.emit("console output", "after-detach"), 2);
        let session = session.lock();
        assert!(!session.is_attached());
        assert!(session.texts().is_empty());
    }

    #[test]
    fn stale_delivery_does_not_reach_a_reattached_buffer() {
        let (local, channel) = connected();
        let session = Arc::new(Mutex::new(SessionController::new("srv")));
        detaching_listener(&local, &session);
        session.lock().attach(Arc::clone(&channel));
        local.emit("console output", "dropped");

        let (other, other_channel) = connected();
        session.lock().attach(other_channel);
        other.emit("console output", "fresh");
        assert_eq!(session.lock().texts(), vec!["fresh"]);
    }
}
