//! Recorded agent events, one JSON object per line.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranscriptEvent {
    pub event: String,
    #[serde(default)]
    pub payload: Option<String>,
}

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("failed to read transcript: {0}")]
    Io(#[from] std::io::Error),
    #[error("transcript line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
}

pub fn parse(raw: &str) -> Result<Vec<TranscriptEvent>, TranscriptError> {
    raw.lines()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(idx, text)| {
            serde_json::from_str(text).map_err(|source| TranscriptError::Parse {
                line: idx + 1,
                source,
            })
        })
        .collect()
}

pub fn load(path: &Path) -> Result<Vec<TranscriptEvent>, TranscriptError> {
    parse(&fs::read_to_string(path)?)
}
