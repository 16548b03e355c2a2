use std::time::{Duration, Instant};

pub const DEFAULT_FIT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Trailing debounce between resize notifications and refitting the terminal.
#[derive(Debug, Clone)]
pub struct ViewportFitter {
    delay: Duration,
    pending_since: Option<Instant>,
}

impl ViewportFitter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending_since: None,
        }
    }

    pub fn notify_resize(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    /// Returns `true` once the last notification is at least `delay` old.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.saturating_duration_since(since) >= self.delay => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for ViewportFitter {
    fn default() -> Self {
        Self::new(DEFAULT_FIT_DEBOUNCE)
    }
}
