mod cli;
mod config;
mod error;
mod installer;
mod models;
mod ui;

use clap::Parser;
use cli::{Cli, MenuController};
use colored::*;
use config::Config;
use error::{AppError, Result};
use installer::{Installer, PipInstaller};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use ui::{with_spinner, TerminalPrompter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e.to_string().red());
            return ExitCode::FAILURE;
        },
    };

    // Keep the guard alive so buffered file logs are flushed on exit.
    let _log_guard = init_logging(&config);
    config.color.apply();

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal: {:?}", e);
            eprintln!("{} {}", "Error:".red(), e.to_string().red());
            if matches!(e, AppError::ProcessNotFound { .. }) {
                eprintln!(
                    "{}",
                    "Could not find pip. Please ensure pip is installed or set PIP_MANAGER_INSTALLER."
                        .red()
                );
            }
            ExitCode::FAILURE
        },
    }
}

/// Logs go to a daily file when a log directory is configured, since stdout and
/// stderr belong to the menu; otherwise to stderr, filtered by RUST_LOG.
fn init_logging(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env();
    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "pip-manager.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        },
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        },
    }
}

async fn run(config: &Config) -> Result<()> {
    info!("Initializing pip manager (listing format: {})", config.format);

    let pip = with_spinner("Locating pip executable", PipInstaller::detect(config)).await?;
    info!("Installer resolved to `{}`", pip.command_line());
    println!(
        "{}",
        format!("Using {}: {}", pip.command_line(), pip.version_banner()).blue()
    );

    let mut menu = MenuController::new(pip, TerminalPrompter::new(), std::io::stdout());
    menu.run().await
}
