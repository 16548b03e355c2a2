/// A key press delivered to the terminal pane (not the command line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalKey {
    pub key: TerminalKeyCode,
    pub ctrl: bool,
}

impl TerminalKey {
    pub fn plain(key: TerminalKeyCode) -> Self {
        Self { key, ctrl: false }
    }

    pub fn ctrl(c: char) -> Self {
        Self {
            key: TerminalKeyCode::Char(c),
            ctrl: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKeyCode {
    Char(char),
    Escape,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalAction {
    CopySelection,
    ShowSearch,
    HideSearch,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interception {
    pub action: TerminalAction,
    /// `false` when the platform default for this key must not run.
    pub proceed: bool,
}

pub fn intercept(key: TerminalKey) -> Interception {
    match (key.ctrl, key.key) {
        (true, TerminalKeyCode::Char('c')) => Interception {
            action: TerminalAction::CopySelection,
            proceed: false,
        },
        (true, TerminalKeyCode::Char('f')) => Interception {
            action: TerminalAction::ShowSearch,
            proceed: false,
        },
        (_, TerminalKeyCode::Escape) => Interception {
            action: TerminalAction::HideSearch,
            proceed: true,
        },
        _ => Interception {
            action: TerminalAction::None,
            proceed: true,
        },
    }
}
