use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::OnceLock;

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub file: Option<PathBuf>,
}

#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("logging already initialized")]
    AlreadyInitialized,
    #[error("failed to open log file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to configure logger: {0}")]
    Configure(String),
}

static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Installs the global subscriber. Calling it again is a no-op.
pub fn init(config: &LogConfig) -> Result<(), InitError> {
    if GUARD.get().is_some() {
        return Ok(());
    }

    let (writer, guard) = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| InitError::Io {
                    path: path.clone(),
                    source,
                })?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config.level.to_filter()))
        .with_level(true)
        .with_target(config.level >= LogLevel::Debug)
        .with_ansi(config.file.is_none())
        .with_writer(writer)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| InitError::Configure(err.to_string()))?;
    GUARD.set(guard).map_err(|_| InitError::AlreadyInitialized)
}

fn env_filter(level: LevelFilter) -> EnvFilter {
    if let Ok(filter) = std::env::var("PANEL_LOG_FILTER") {
        return EnvFilter::new(filter);
    }
    EnvFilter::new(default_directives(level))
}

fn default_directives(level: LevelFilter) -> String {
    let base = match level {
        // Events use `panel::*` targets alongside module-path targets.
        LevelFilter::TRACE => {
            "info,panel_console_core=trace,panel_console=trace,event_channel=trace,panel=trace"
        }
        LevelFilter::DEBUG => {
            "info,panel_console_core=debug,panel_console=debug,event_channel=debug,panel=debug"
        }
        LevelFilter::INFO => "info",
        LevelFilter::WARN => "warn",
        LevelFilter::ERROR => "error",
        LevelFilter::OFF => "off",
    };
    let mut directives = base.to_owned();
    if level == LevelFilter::TRACE && !super::env_truthy("PANEL_TRACE_DEPS").unwrap_or(false) {
        directives.push_str(",tokio=info,mio=info");
    }
    directives
}
