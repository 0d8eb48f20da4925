//! Command-line surface of the `clickdeck` binary.
//!
//! The tray process is the default; the subcommands manage saved layouts
//! and the start-at-login registration without opening any window.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clickdeck_core::autostart::{Autostart, reconcile};
use clickdeck_core::config::{Config, Directories};
use clickdeck_core::store::{JsonLayoutStore, LayoutLibrary};
use tracing::info;

use crate::error::Result;

/// clickdeck - a right-click launcher for your desktop
#[derive(Parser, Debug)]
#[command(name = "clickdeck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Use this directory for config, items, layouts and logs
    #[arg(long, value_name = "PATH", global = true)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the tray process (default)
    Run,

    /// Manage saved layouts
    Layouts {
        #[command(subcommand)]
        action: LayoutsCommand,
    },

    /// Manage starting clickdeck at login
    Autostart {
        #[command(subcommand)]
        action: AutostartCommand,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum LayoutsCommand {
    /// List saved layouts
    List,

    /// Write one layout to a standalone file
    Export { name: String, file: PathBuf },

    /// Add a layout from a file
    Import { file: PathBuf },

    /// Delete a layout
    Delete { name: String },

    /// Rename a layout
    Rename { old: String, new: String },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutostartCommand {
    /// Show whether clickdeck starts at login
    Status,

    /// Start clickdeck at login
    Enable,

    /// Stop starting clickdeck at login
    Disable,
}

impl Cli {
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    #[must_use]
    pub fn directories(&self) -> Directories {
        self.config_dir
            .clone()
            .map_or_else(Directories::new, Directories::with_base)
    }
}

#[must_use]
pub fn layout_library(dirs: &Directories) -> LayoutLibrary {
    LayoutLibrary::new(Box::new(JsonLayoutStore::new(dirs.layouts_file.clone())))
}

/// Run a `layouts` subcommand, writing human-readable output to `out`.
///
/// # Errors
///
/// Returns the layout library's error (unknown name, name clash, bad file)
/// or an error writing to `out`.
pub fn run_layouts(dirs: &Directories, command: &LayoutsCommand, out: &mut dyn Write) -> Result<()> {
    let library = layout_library(dirs);

    match command {
        LayoutsCommand::List => {
            let layouts = library.list();
            if layouts.is_empty() {
                writeln!(out, "No saved layouts")?;
            }
            for layout in layouts {
                writeln!(
                    out,
                    "{:<24} {:>3} items  {:<9} {}",
                    layout.name,
                    layout.item_count(),
                    layout.window_size_display(),
                    layout.icon_settings_display()
                )?;
            }
        }
        LayoutsCommand::Export { name, file } => {
            library.export(name, file)?;
            writeln!(out, "Exported '{name}' to {}", file.display())?;
        }
        LayoutsCommand::Import { file } => {
            let layout = library.import(file)?;
            writeln!(out, "Imported '{}'", layout.name)?;
        }
        LayoutsCommand::Delete { name } => {
            library.delete(name)?;
            writeln!(out, "Deleted '{name}'")?;
        }
        LayoutsCommand::Rename { old, new } => {
            library.rename(old, new)?;
            writeln!(out, "Renamed '{old}' to '{new}'")?;
        }
    }
    Ok(())
}

/// Run an `autostart` subcommand.
///
/// `enable` and `disable` also record the choice in `config.json` so the
/// tray process keeps it on its next start.
///
/// # Errors
///
/// Returns the autostart backend's error, a config read/write error, or an
/// error writing to `out`.
pub fn run_autostart(
    autostart: &dyn Autostart,
    dirs: &Directories,
    command: AutostartCommand,
    out: &mut dyn Write,
) -> Result<()> {
    let wanted = match command {
        AutostartCommand::Status => {
            let state = if autostart.is_registered()? {
                "enabled"
            } else {
                "disabled"
            };
            writeln!(out, "Start at login: {state}")?;
            return Ok(());
        }
        AutostartCommand::Enable => true,
        AutostartCommand::Disable => false,
    };

    reconcile(autostart, wanted)?;

    let mut config = Config::load(&dirs.config_file)?;
    if config.behavior.launch_on_startup != wanted {
        config.behavior.launch_on_startup = wanted;
        std::fs::create_dir_all(&dirs.config)?;
        config.save(&dirs.config_file)?;
        info!("Saved launchOnStartup={wanted}");
    }

    let state = if wanted { "enabled" } else { "disabled" };
    writeln!(out, "Start at login: {state}")?;
    Ok(())
}
