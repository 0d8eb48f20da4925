//! clickdeck tray process library.
//!
//! Hosts the CLI commands, the config hot-reload watcher and the platform
//! glue that turns global right-clicks into popup sessions.

pub mod cli;
pub mod config_watcher;
pub mod error;
pub mod platform;

pub use error::{DaemonError, Result};
