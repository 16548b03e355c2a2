use std::sync::Arc;

use event_channel::{EventChannel, Handler, ListenerId};

use super::events::InboundEvent;

/// The listeners one attach registered on a channel.
///
/// Dropping the subscription removes every listener it added.
pub struct Subscription {
    channel: Arc<dyn EventChannel>,
    listeners: Vec<(InboundEvent, ListenerId)>,
}

impl Subscription {
    pub fn bind(
        channel: Arc<dyn EventChannel>,
        handlers: impl IntoIterator<Item = (InboundEvent, Handler)>,
    ) -> Self {
        let mut listeners: Vec<(InboundEvent, ListenerId)> = Vec::new();
        for (event, handler) in handlers {
            // One handler per event name, first registration wins.
            if listeners.iter().any(|(existing, _)| *existing == event) {
                continue;
            }
            let id = channel.add_listener(event.as_str(), handler);
            listeners.push((event, id));
        }
        Self { channel, listeners }
    }

    pub fn channel(&self) -> &Arc<dyn EventChannel> {
        &self.channel
    }

    pub fn is_bound_to(&self, channel: &Arc<dyn EventChannel>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.channel), Arc::as_ptr(channel))
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Removes all listeners; returns how many the channel still knew about.
    pub fn release(mut self) -> usize {
        self.unbind()
    }

    fn unbind(&mut self) -> usize {
        let channel = &self.channel;
        self.listeners
            .drain(..)
            .filter(|(event, id)| channel.remove_listener(event.as_str(), *id))
            .count()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unbind();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("listeners", &self.listeners)
            .finish()
    }
}
