//! Per-server command history.

mod error;
mod file;

pub use error::HistoryError;
pub use file::FileHistoryStore;

use std::collections::HashMap;

use parking_lot::Mutex;

/// Maximum number of commands kept per server.
pub const HISTORY_LIMIT: usize = 32;

/// Storage key for a server's history.
pub fn history_key(server_id: &str) -> String {
    format!("{server_id}:command_history")
}

/// Prepends `command` and truncates to [`HISTORY_LIMIT`].
pub fn prepend_bounded(entries: &mut Vec<String>, command: &str) {
    entries.insert(0, command.to_string());
    entries.truncate(HISTORY_LIMIT);
}

/// Durable, bounded list of submitted commands, most recent first.
pub trait HistoryStore: Send + Sync {
    fn read(&self, server_id: &str) -> Vec<String>;
    fn push(&self, server_id: &str, command: &str) -> Result<(), HistoryError>;
}

#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    entries: Mutex<HashMap<String, Vec<String>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn read(&self, server_id: &str) -> Vec<String> {
        self.entries
            .lock()
            .get(&history_key(server_id))
            .cloned()
            .unwrap_or_default()
    }

    fn push(&self, server_id: &str, command: &str) -> Result<(), HistoryError> {
        let mut guard = self.entries.lock();
        let entries = guard.entry(history_key(server_id)).or_default();
        prepend_bounded(entries, command);
        Ok(())
    }
}
