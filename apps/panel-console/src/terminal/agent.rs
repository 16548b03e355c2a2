//! Local stand-in for the remote agent, used by the interactive shell.

use std::sync::Arc;

use event_channel::{ChannelMessage, LocalChannel};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::session::{InboundEvent, OutboundEvent};

/// Answers outbound requests on `channel` until the task is aborted.
pub fn spawn(channel: Arc<LocalChannel>, server_id: String) -> JoinHandle<()> {
    // Subscribe before the console attaches so the first `send logs` is seen.
    let mut tap = channel.agent_tap();
    tokio::spawn(async move {
        loop {
            match tap.recv().await {
                Ok(message) => respond(&channel, &server_id, &message),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(target: "panel::agent", skipped, "echo agent lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

pub fn respond(channel: &LocalChannel, server_id: &str, message: &ChannelMessage) {
    let emit = |event: InboundEvent, payload: &str| {
        channel.emit(event.as_str(), payload);
    };

    if message.event == OutboundEvent::SendLogs.as_str() {
        emit(
            InboundEvent::ConsoleOutput,
            &format!("Attached to server {server_id}.\n"),
        );
        return;
    }
    if message.event != OutboundEvent::SendCommand.as_str() {
        return;
    }

    let command = message.payload.as_deref().unwrap_or_default();
    let power: &[&str] = match command.trim() {
        "start" => &["starting", "running"],
        "stop" => &["stopping", "offline"],
        "restart" => &["stopping", "offline", "starting", "running"],
        _ => &[],
    };
    if power.is_empty() {
        emit(InboundEvent::ConsoleOutput, &format!("> {command}\n"));
    }
    for state in power {
        emit(InboundEvent::Status, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_channel::{EventChannel, Handler};
    use parking_lot::Mutex;

    fn listen(channel: &LocalChannel, event: &str) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler: Handler = Arc::new(move |payload: &str| sink.lock().push(payload.to_string()));
        channel.add_listener(event, handler);
        seen
    }

    fn command(payload: &str) -> ChannelMessage {
        ChannelMessage {
            event: "send command".into(),
            payload: Some(payload.into()),
        }
    }

    #[test]
    fn echoes_plain_commands() {
        let channel = LocalChannel::new();
        let output = listen(&channel, "console output");
        respond(&channel, "srv", &command("say hello"));
        assert_eq!(*output.lock(), vec!["> say hello\n"]);
    }

    #[test]
    fn power_commands_report_status() {
        let channel = LocalChannel::new();
        let status = listen(&channel, "status");
        respond(&channel, "srv", &command("restart"));
        assert_eq!(
            *status.lock(),
            vec!["stopping", "offline", "starting", "running"]
        );
    }

    #[tokio::test]
    async fn answers_log_requests() {
        let channel = Arc::new(LocalChannel::new());
        let output = listen(&channel, "console output");
        let agent = spawn(Arc::clone(&channel), "srv".into());
        channel.send("send logs", None).expect("send ok");
        for _ in 0..50 {
            if !output.lock().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        agent.abort();
        assert_eq!(*output.lock(), vec!["Attached to server srv.\n"]);
    }
}
