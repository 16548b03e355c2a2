use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::client::viewport::DEFAULT_FIT_DEBOUNCE;
use crate::output::DEFAULT_SCROLLBACK;

/// Console configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// History file override; `None` uses `~/.panel-console/command_history.toml`
    pub history_path: Option<PathBuf>,
    /// Lines retained by the output buffer
    pub scrollback: usize,
    /// Quiet period after the last resize before the terminal is refitted
    pub resize_debounce: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let history_path = env::var("PANEL_HISTORY_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        let scrollback = parse_var("PANEL_SCROLLBACK")
            .filter(|lines: &usize| *lines > 0)
            .unwrap_or(DEFAULT_SCROLLBACK);
        let resize_debounce = parse_var("PANEL_RESIZE_DEBOUNCE_MS")
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_FIT_DEBOUNCE);
        Self {
            history_path,
            scrollback,
            resize_debounce,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_path: None,
            scrollback: DEFAULT_SCROLLBACK,
            resize_debounce: DEFAULT_FIT_DEBOUNCE,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(target: "panel::config", var = name, value = %raw, "ignoring unparsable value");
            None
        }
    }
}
