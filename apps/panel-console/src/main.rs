use clap::Parser;
use panel_console_core::telemetry::logging;
use panel_console_core::terminal::{app, cli::Cli, error::CliError};
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_config = cli.logging.to_config();
    logging::init(&log_config).map_err(|err| CliError::Logging(err.to_string()))?;
    debug!(log_level = ?log_config.level, log_file = ?log_config.file, "logging configured");
    app::run(cli).await?;
    Ok(())
}
