use crate::history::HistoryError;
use crate::terminal::transcript::TranscriptError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    History(#[from] HistoryError),
    #[error("{0}")]
    Transcript(#[from] TranscriptError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("logging initialization failed: {0}")]
    Logging(String),
}
