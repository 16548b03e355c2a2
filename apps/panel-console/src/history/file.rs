use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{HISTORY_LIMIT, HistoryError, HistoryStore, history_key, prepend_bounded};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HistoryDocument {
    #[serde(default)]
    histories: BTreeMap<String, Vec<String>>,
}

impl HistoryDocument {
    fn compact(&mut self) {
        for entries in self.histories.values_mut() {
            entries.truncate(HISTORY_LIMIT);
        }
        self.histories.retain(|_, entries| !entries.is_empty());
    }
}

/// History persisted as a TOML document, one array per `<serverId>:command_history` key.
#[derive(Debug)]
pub struct FileHistoryStore {
    path: PathBuf,
    cache: Mutex<Option<HistoryDocument>>,
}

impl FileHistoryStore {
    pub fn default_path() -> Result<PathBuf, HistoryError> {
        let base = BaseDirs::new()
            .ok_or_else(|| HistoryError::Config("unable to determine home directory".into()))?;
        Ok(base
            .home_dir()
            .join(".panel-console")
            .join("command_history.toml"))
    }

    pub fn open_default() -> Result<Self, HistoryError> {
        Ok(Self::at(Self::default_path()?))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<HistoryDocument, HistoryError> {
        if !path.exists() {
            return Ok(HistoryDocument::default());
        }
        let raw = fs::read_to_string(path)?;
        let mut document: HistoryDocument = toml::from_str(&raw)?;
        document.compact();
        Ok(document)
    }

    fn save(path: &Path, document: &HistoryDocument) -> Result<(), HistoryError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let serialized = toml::to_string_pretty(document)?;
        let mut options = OpenOptions::new();
        options.create(true).write(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;
        file.write_all(serialized.as_bytes())?;
        Ok(())
    }
}

impl HistoryStore for FileHistoryStore {
    fn read(&self, server_id: &str) -> Vec<String> {
        let mut cache = self.cache.lock();
        if cache.is_none() {
            match Self::load(&self.path) {
                Ok(document) => *cache = Some(document),
                Err(err) => {
                    tracing::warn!(
                        target: "panel::history",
                        path = %self.path.display(),
                        error = %err,
                        "failed to load command history"
                    );
                    return Vec::new();
                }
            }
        }
        cache
            .as_ref()
            .and_then(|document| document.histories.get(&history_key(server_id)))
            .cloned()
            .unwrap_or_default()
    }

    /// The cache only advances once the document is on disk.
    fn push(&self, server_id: &str, command: &str) -> Result<(), HistoryError> {
        let mut cache = self.cache.lock();
        let mut document = match cache.as_ref() {
            Some(document) => document.clone(),
            None => Self::load(&self.path)?,
        };
        let entries = document
            .histories
            .entry(history_key(server_id))
            .or_default();
        prepend_bounded(entries, command);
        Self::save(&self.path, &document)?;
        *cache = Some(document);
        Ok(())
    }
}
