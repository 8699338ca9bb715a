//! Mini LIMS portal - command-line shell

mod commands;
mod config;
mod logging;
mod render;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::Commands;
use lims_portal_core::FatalError;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Level, error, info};

/// Exit status for command failures
const EXIT_FAILURE: i32 = 1;

/// Exit status when the portal cannot boot at all
const EXIT_FATAL: i32 = 2;

#[derive(Parser)]
#[command(name = "lims-portal")]
#[command(about = "Session shell for the Mini LIMS web portal")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "info")]
    log_level: LogLevel,

    /// Data directory for the session jar, settings and logs
    #[arg(short = 'd', long, global = true)]
    data_dir: Option<PathBuf>,

    /// Settings file (defaults to <data_dir>/portal.toml when present)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Timeout for one-shot commands in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "30")]
    timeout: u64,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = config::resolve_data_dir(cli.data_dir);
    logging::init_logging(cli.log_level.into(), &data_dir, cli.no_file_log)?;

    info!(data_dir = %data_dir.display(), "Starting LIMS portal");

    let settings = match config::load_settings(cli.config.as_deref(), &data_dir) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load settings: {e}");
            std::process::exit(EXIT_FAILURE);
        }
    };

    // The interactive shell runs until the user quits
    let limit = (cli.timeout > 0 && !cli.command.is_interactive())
        .then(|| Duration::from_secs(cli.timeout));

    let run = cli.command.execute(data_dir, settings);
    let result = match limit {
        Some(limit) => match tokio::time::timeout(limit, run).await {
            Ok(result) => result,
            Err(_) => {
                error!("Command timed out after {} seconds", cli.timeout);
                std::process::exit(EXIT_FAILURE);
            }
        },
        None => run.await,
    };

    match result {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {e}");
            let code = if e.downcast_ref::<FatalError>().is_some() {
                EXIT_FATAL
            } else {
                EXIT_FAILURE
            };
            std::process::exit(code);
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}
