/// Progress of a server transfer between nodes, as reported over `transfer status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransferState {
    #[default]
    None,
    /// The source node archived the server and is handing off to the target.
    Archiving,
    Failed,
}

pub const ARCHIVED_LINE: &str =
    "Server has been archived successfully, attempting connection to target node..";
pub const FAILED_LINE: &str = "Transfer has failed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: TransferState,
    pub to: TransferState,
    pub line: &'static str,
}

impl TransferState {
    /// Applies a reported status. `None` means the status is unknown or has no
    /// transition from the current state; either way nothing is rendered.
    pub fn advance(&mut self, status: &str) -> Option<Transition> {
        let from = *self;
        let (to, line) = match (from, status) {
            (TransferState::None, "archive") => (TransferState::Archiving, ARCHIVED_LINE),
            (TransferState::None | TransferState::Archiving, "failure") => {
                (TransferState::Failed, FAILED_LINE)
            }
            _ => return None,
        };
        *self = to;
        Some(Transition { from, to, line })
    }

    pub fn reset(&mut self) {
        *self = TransferState::None;
    }
}
