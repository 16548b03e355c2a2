use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::broadcast;

/// An outbound message as seen by the remote agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    pub event: String,
    pub payload: Option<String>,
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("event channel closed")]
    Closed,
    #[error("event channel transport error: {0}")]
    Transport(String),
}

pub type ChannelResult<T> = Result<T, ChannelError>;

/// Handle returned by [`EventChannel::add_listener`]; the only way to remove a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

pub type Handler = Arc<dyn Fn(&str) + Send + Sync>;

/// Named-event connection to a remote agent.
///
/// Implementations deliver events for a given name in the order the agent
/// emitted them. Reconnection is the implementation's concern; consumers only
/// observe [`EventChannel::connected`].
pub trait EventChannel: Send + Sync {
    fn send(&self, event: &str, payload: Option<&str>) -> ChannelResult<()>;
    fn add_listener(&self, event: &str, handler: Handler) -> ListenerId;
    /// Returns `false` when no listener with `id` was registered under `event`.
    fn remove_listener(&self, event: &str, id: ListenerId) -> bool;
    fn connected(&self) -> bool;
}

/// In-process channel for tests and local consoles.
///
/// `emit` plays the agent side of inbound delivery; [`LocalChannel::agent_tap`]
/// observes everything sent outbound.
pub struct LocalChannel {
    listeners: RwLock<HashMap<String, Vec<(ListenerId, Handler)>>>,
    next_id: AtomicU64,
    connected: AtomicBool,
    outbound: broadcast::Sender<ChannelMessage>,
}

impl LocalChannel {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            connected: AtomicBool::new(true),
            outbound: broadcast::channel(64).0,
        }
    }

    pub fn disconnected() -> Self {
        let channel = Self::new();
        channel.set_connected(false);
        channel
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn agent_tap(&self) -> broadcast::Receiver<ChannelMessage> {
        self.outbound.subscribe()
    }

    /// Delivers `payload` to every listener of `event` in registration order and
    /// returns how many were invoked.
    pub fn emit(&self, event: &str, payload: &str) -> usize {
        // Handlers may call back into the channel, so dispatch outside the lock.
        let handlers: Vec<Handler> = {
            let guard = self.listeners.read();
            match guard.get(event) {
                Some(entries) => entries.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => Vec::new(),
            }
        };
        for handler in &handlers {
            handler(payload);
        }
        handlers.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().get(event).map_or(0, Vec::len)
    }

    pub fn total_listeners(&self) -> usize {
        self.listeners.read().values().map(Vec::len).sum()
    }
}

impl Default for LocalChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalChannel")
            .field("connected", &self.connected())
            .field("listeners", &self.total_listeners())
            .finish()
    }
}

impl EventChannel for LocalChannel {
    fn send(&self, event: &str, payload: Option<&str>) -> ChannelResult<()> {
        if !self.connected() {
            return Err(ChannelError::Closed);
        }
        let message = ChannelMessage {
            event: event.to_string(),
            payload: payload.map(str::to_string),
        };
        // No tap subscribed means nobody is on the agent side; the message is dropped.
        if self.outbound.send(message).is_err() {
            tracing::trace!(target: "panel::channel", event, "outbound message dropped, no agent tap");
        }
        Ok(())
    }

    fn add_listener(&self, event: &str, handler: Handler) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .entry(event.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    fn remove_listener(&self, event: &str, id: ListenerId) -> bool {
        let mut guard = self.listeners.write();
        let Some(entries) = guard.get_mut(event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            guard.remove(event);
        }
        removed
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
