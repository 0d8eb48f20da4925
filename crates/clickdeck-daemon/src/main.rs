//! clickdeck entry point.
//!
//! Without a subcommand this starts the tray process that watches for the
//! activation chord and opens the launcher popup.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use anyhow::{Context, Result};
use clap::Parser;
use clickdeck_core::config::Directories;
use clickdeck_daemon::cli::{Cli, Command, run_autostart, run_layouts};
use clickdeck_daemon::platform;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Set up logging to a daily rolling file in the logs directory.
/// Debug builds default to debug level and also log to stderr.
fn setup_logging(dirs: &Directories) -> Option<WorkerGuard> {
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("clickdeck={default_level}")));

    let (file_layer, guard) = match std::fs::create_dir_all(&dirs.logs) {
        Ok(()) => {
            let file_appender = tracing_appender::rolling::daily(&dirs.logs, "clickdeck.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("Cannot create log directory {}: {e}", dirs.logs.display());
            (None, None)
        }
    };

    let stderr_layer = cfg!(debug_assertions).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .with(filter)
        .init();

    guard
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let dirs = cli.directories();
    let command = cli.command();

    if command != Command::Run {
        platform::attach_parent_console();
    }

    let _guard = setup_logging(&dirs);

    match command {
        Command::Run => {
            info!(
                "Starting clickdeck {} at {}",
                env!("CARGO_PKG_VERSION"),
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            );
            if let Err(e) = platform::run(dirs) {
                error!("clickdeck stopped: {e}");
                return Err(e).context("clickdeck stopped with an error");
            }
            info!("clickdeck stopped");
        }
        Command::Layouts { action } => {
            run_layouts(&dirs, &action, &mut std::io::stdout().lock())
                .context("Layout command failed")?;
        }
        Command::Autostart { action } => {
            let autostart = platform::system_autostart().context("Autostart unavailable")?;
            run_autostart(autostart.as_ref(), &dirs, action, &mut std::io::stdout().lock())
                .context("Autostart command failed")?;
        }
    }

    Ok(())
}
