/// Console output containing this marker asks the UI to show the license-key dialog.
pub const LICENSE_FAILURE_MARKER: &str = "Could not authenticate server license key";

/// Events the agent pushes to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundEvent {
    Status,
    ConsoleOutput,
    InstallOutput,
    TransferLogs,
    TransferStatus,
    DaemonMessage,
    DaemonError,
}

impl InboundEvent {
    pub const ALL: [InboundEvent; 7] = [
        InboundEvent::Status,
        InboundEvent::ConsoleOutput,
        InboundEvent::InstallOutput,
        InboundEvent::TransferLogs,
        InboundEvent::TransferStatus,
        InboundEvent::DaemonMessage,
        InboundEvent::DaemonError,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InboundEvent::Status => "status",
            InboundEvent::ConsoleOutput => "console output",
            InboundEvent::InstallOutput => "install output",
            InboundEvent::TransferLogs => "transfer logs",
            InboundEvent::TransferStatus => "transfer status",
            InboundEvent::DaemonMessage => "daemon message",
            InboundEvent::DaemonError => "daemon error",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|event| event.as_str() == name)
    }
}

/// Requests the console sends to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutboundEvent {
    SendCommand,
    SendLogs,
}

impl OutboundEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            OutboundEvent::SendCommand => "send command",
            OutboundEvent::SendLogs => "send logs",
        }
    }
}
