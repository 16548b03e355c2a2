use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::telemetry::logging::{LogConfig, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "panel-console",
    about = "Live server console driven by a remote agent's event stream",
    author,
    version = concat!(env!("CARGO_PKG_VERSION"), "-", env!("BUILD_TIMESTAMP"))
)]
pub struct Cli {
    #[arg(
        long = "history-file",
        global = true,
        env = "PANEL_HISTORY_PATH",
        value_name = "PATH",
        help = "Command history file (defaults to ~/.panel-console/command_history.toml)"
    )]
    pub history_file: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LoggingArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct LoggingArgs {
    #[arg(
        long = "log-level",
        global = true,
        value_enum,
        env = "PANEL_LOG_LEVEL",
        default_value_t = LogLevel::Warn,
        help = "Minimum log level (error, warn, info, debug, trace)"
    )]
    pub level: LogLevel,

    #[arg(
        long = "log-file",
        global = true,
        value_name = "PATH",
        env = "PANEL_LOG_FILE",
        help = "Write structured logs to the specified file"
    )]
    pub file: Option<PathBuf>,
}

impl LoggingArgs {
    pub fn to_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            file: self.file.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a recorded agent event transcript through the console
    Replay(ReplayArgs),
    /// Interactive console against a local echo agent
    Shell(ShellArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    #[arg(long, short = 's', help = "Server identifier the transcript belongs to")]
    pub server: String,

    #[arg(long, short = 't', value_name = "FILE", help = "JSON-lines transcript of agent events")]
    pub transcript: PathBuf,

    #[arg(long, help = "Treat the server as mid-transfer (keeps prior output on attach)")]
    pub transferring: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ShellArgs {
    #[arg(long, short = 's', help = "Server identifier to attach to")]
    pub server: String,

    #[arg(
        long = "permission",
        value_name = "CAPABILITY",
        help = "Capability granted to this user, e.g. control.console (repeatable)"
    )]
    pub permissions: Vec<String>,
}
