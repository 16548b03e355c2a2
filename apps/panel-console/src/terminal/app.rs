use std::sync::Arc;

use event_channel::LocalChannel;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::client::{CONSOLE_CONTROL, Capabilities, ConsoleView, Key};
use crate::config::Config;
use crate::history::{FileHistoryStore, HistoryStore, MemoryHistoryStore};
use crate::terminal::agent;
use crate::terminal::cli::{Cli, Command, ReplayArgs, ShellArgs};
use crate::terminal::error::CliError;
use crate::terminal::render::StdoutSink;
use crate::terminal::transcript;

pub async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = Config::from_env();
    if let Some(path) = cli.history_file {
        config.history_path = Some(path);
    }

    match cli.command {
        Command::Replay(args) => replay(&config, args),
        Command::Shell(args) => shell(&config, args).await,
    }
}

fn open_history(config: &Config) -> Result<Arc<dyn HistoryStore>, CliError> {
    let store = match &config.history_path {
        Some(path) => FileHistoryStore::at(path.clone()),
        None => FileHistoryStore::open_default()?,
    };
    info!(target: "panel::history", path = %store.path().display(), "using command history file");
    Ok(Arc::new(store))
}

fn replay(config: &Config, args: ReplayArgs) -> Result<(), CliError> {
    let events = transcript::load(&args.transcript)?;
    let channel = Arc::new(LocalChannel::new());

    let mut view = ConsoleView::mount(
        args.server.as_str(),
        &Capabilities::none(),
        Arc::new(MemoryHistoryStore::new()),
        config,
    );
    view.session().set_sink(Box::new(StdoutSink::stdout()));
    view.set_transferring(args.transferring);
    view.set_channel(Some(channel.clone()));

    for event in &events {
        channel.emit(&event.event, event.payload.as_deref().unwrap_or_default());
    }
    info!(
        target: "panel::session",
        server = %args.server,
        events = events.len(),
        transfer = ?view.transfer_state(),
        "transcript replayed"
    );
    if view.remedial_dialog_visible() {
        eprintln!("server license key could not be authenticated; update it in the server settings");
    }
    view.unmount();
    Ok(())
}

async fn shell(config: &Config, args: ShellArgs) -> Result<(), CliError> {
    let store = open_history(config)?;
    let capabilities: Capabilities = args.permissions.iter().cloned().collect();
    let channel = Arc::new(LocalChannel::new());
    let agent = agent::spawn(Arc::clone(&channel), args.server.clone());

    let mut view = ConsoleView::mount(args.server.as_str(), &capabilities, store, config);
    view.session().set_sink(Box::new(StdoutSink::stdout()));
    view.set_channel(Some(channel.clone()));
    if !view.input_visible() {
        eprintln!("read-only console: the {CONSOLE_CONTROL} permission is required to send commands");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !view.input_visible() {
            continue;
        }
        view.type_text(&line);
        view.key_down(Key::Enter);
    }

    view.unmount();
    agent.abort();
    Ok(())
}
