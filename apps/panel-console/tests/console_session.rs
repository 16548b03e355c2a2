use std::sync::Arc;

use event_channel::{EventChannel, LocalChannel};
use panel_console_core::client::{CONSOLE_CONTROL, Capabilities, ConsoleView, Key};
use panel_console_core::config::Config;
use panel_console_core::history::{HISTORY_LIMIT, HistoryStore, MemoryHistoryStore};
use panel_console_core::output::LineKind;
use panel_console_core::session::transfer::{ARCHIVED_LINE, FAILED_LINE};
use panel_console_core::session::{InboundEvent, SessionController, TransferState};

fn channel() -> (Arc<LocalChannel>, Arc<dyn EventChannel>) {
    let local = Arc::new(LocalChannel::new());
    let shared: Arc<dyn EventChannel> = local.clone();
    (local, shared)
}

fn operator() -> Capabilities {
    [CONSOLE_CONTROL].into_iter().collect()
}

#[test]
fn output_follows_event_arrival_order() {
    let (local, shared) = channel();
    let mut session = SessionController::new("srv");
    session.attach(shared);

    local.emit("console output", "first\n");
    local.emit("status", "starting");
    local.emit("install output", "second\r\n");
    local.emit("transfer logs", "third\r");
    local.emit("daemon message", "fourth");
    local.emit("daemon error", "fifth\n\n");

    assert_eq!(
        session.texts(),
        vec![
            "first",
            "Server marked as starting...",
            "second",
            "third",
            "fourth",
            "fifth\n",
        ]
    );
    let seqs: Vec<u64> = session.lines().iter().map(|line| line.seq).collect();
    assert!(seqs.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn double_attach_does_not_duplicate_delivery() {
    let (local, shared) = channel();
    let mut session = SessionController::new("srv");
    session.attach(Arc::clone(&shared));
    session.attach(Arc::clone(&shared));

    assert_eq!(local.emit("console output", "once"), 1);
    assert_eq!(session.texts(), vec!["once"]);
    assert_eq!(local.total_listeners(), InboundEvent::ALL.len());
}

#[test]
fn each_attach_requests_logs_once() {
    let (local, shared) = channel();
    let mut tap = local.agent_tap();
    let mut session = SessionController::new("srv");
    session.attach(Arc::clone(&shared));
    session.attach(shared);

    let mut requests = 0;
    while let Ok(message) = tap.try_recv() {
        assert_eq!(message.event, "send logs");
        requests += 1;
    }
    assert_eq!(requests, 2);
}

#[test]
fn archive_then_failure_renders_two_prelude_lines() {
    let (local, shared) = channel();
    let mut session = SessionController::new("srv");
    session.attach(shared);

    local.emit("transfer status", "archive");
    local.emit("transfer status", "failure");
    local.emit("transfer status", "archive");
    local.emit("transfer status", "completed");

    let lines = session.lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].text, ARCHIVED_LINE);
    assert_eq!(lines[1].text, FAILED_LINE);
    assert!(lines.iter().all(|line| line.kind == LineKind::Prelude));
    assert_eq!(session.transfer_state(), TransferState::Failed);
}

#[test]
fn license_marker_sets_flag_from_console_output_only() {
    let (local, shared) = channel();
    let mut session = SessionController::new("srv");
    session.attach(shared);

    local.emit("daemon message", "Could not authenticate server license key");
    assert!(!session.remedial_dialog_requested());

    local.emit(
        "console output",
        "[   script:fivem] Could not authenticate server license key (code 12)",
    );
    assert!(session.remedial_dialog_requested());
    assert_eq!(session.texts().len(), 2);
}

#[test]
fn transferring_reattach_preserves_output() {
    let (local, shared) = channel();
    let mut session = SessionController::new("srv");
    session.attach(Arc::clone(&shared));
    local.emit("transfer status", "archive");
    local.emit("transfer logs", "copying world");

    session.set_transferring(true);
    let (target, target_shared) = channel();
    session.attach(target_shared);
    target.emit("transfer logs", "restoring world");

    assert_eq!(
        session.texts(),
        vec![ARCHIVED_LINE, "copying world", "restoring world"]
    );
    assert_eq!(session.transfer_state(), TransferState::Archiving);
    assert_eq!(local.total_listeners(), 0);
}

#[test]
fn plain_reattach_clears_output_and_resets_transfer() {
    let (local, shared) = channel();
    let mut session = SessionController::new("srv");
    session.attach(Arc::clone(&shared));
    local.emit("console output", "old");
    local.emit("transfer status", "failure");
    assert_eq!(session.transfer_state(), TransferState::Failed);

    session.attach(shared);
    assert!(session.texts().is_empty());
    assert_eq!(session.transfer_state(), TransferState::None);

    local.emit("console output", "new");
    assert_eq!(session.texts(), vec!["new"]);
}

#[test]
fn detach_stops_output_immediately() {
    let (local, shared) = channel();
    let mut session = SessionController::new("srv");
    session.attach(shared);
    local.emit("console output", "before");
    session.detach();
    local.emit("console output", "after");
    assert_eq!(session.texts(), vec!["before"]);
}

#[test]
fn submitted_commands_reach_the_agent_and_history() {
    let store = Arc::new(MemoryHistoryStore::new());
    let (local, shared) = channel();
    let mut tap = local.agent_tap();
    let mut view = ConsoleView::mount("srv", &operator(), store.clone(), &Config::default());
    view.set_channel(Some(shared));
    let _ = tap.try_recv();

    view.type_text("restart");
    view.key_down(Key::Enter);

    assert_eq!(view.input_value(), "");
    assert_eq!(store.read("srv"), vec!["restart"]);
    let message = tap.try_recv().expect("command sent");
    assert_eq!(message.event, "send command");
    assert_eq!(message.payload.as_deref(), Some("restart"));
}

#[test]
fn history_survives_remount() {
    let store: Arc<dyn HistoryStore> = Arc::new(MemoryHistoryStore::new());
    let (_local, shared) = channel();
    {
        let mut view = ConsoleView::mount("srv", &operator(), Arc::clone(&store), &Config::default());
        view.set_channel(Some(Arc::clone(&shared)));
        for command in ["a", "b"] {
            view.type_text(command);
            view.key_down(Key::Enter);
        }
    }

    let mut view = ConsoleView::mount("srv", &operator(), Arc::clone(&store), &Config::default());
    view.set_channel(Some(shared));
    assert_eq!(view.history(), ["b".to_string(), "a".to_string()]);
    view.key_down(Key::ArrowUp);
    assert_eq!(view.input_value(), "b");

    let other = ConsoleView::mount("other", &operator(), store, &Config::default());
    assert!(other.history().is_empty());
}

#[test]
fn history_is_capped_through_the_view() {
    let store = Arc::new(MemoryHistoryStore::new());
    let (_local, shared) = channel();
    let mut view = ConsoleView::mount("srv", &operator(), store.clone(), &Config::default());
    view.set_channel(Some(shared));
    for n in 0..40 {
        view.type_text(&format!("say {n}"));
        view.key_down(Key::Enter);
    }
    assert_eq!(view.history().len(), HISTORY_LIMIT);
    assert_eq!(view.history()[0], "say 39");
    assert_eq!(store.read("srv").last().map(String::as_str), Some("say 8"));
}

#[test]
fn disconnected_view_keeps_navigation_but_blocks_submit() {
    let store = Arc::new(MemoryHistoryStore::new());
    store.push("srv", "list").unwrap();
    let local = Arc::new(LocalChannel::disconnected());
    let mut tap = local.agent_tap();
    let mut view = ConsoleView::mount("srv", &operator(), store.clone(), &Config::default());
    view.set_channel(Some(local.clone()));

    assert!(view.loading());
    assert!(!view.input_enabled());
    view.key_down(Key::ArrowUp);
    assert_eq!(view.input_value(), "list");
    view.key_down(Key::Enter);
    assert_eq!(view.input_value(), "list");
    assert_eq!(store.read("srv"), vec!["list"]);
    assert!(tap.try_recv().is_err());
}
