//! OS glue for the tray process.
//!
//! Windows gets the full implementation; elsewhere the tray process and
//! autostart report [`DaemonError::Unsupported`](crate::DaemonError).

#[cfg(not(windows))]
mod unsupported;
#[cfg(windows)]
mod win32;

#[cfg(not(windows))]
pub use unsupported::{attach_parent_console, run, system_autostart};
#[cfg(windows)]
pub use win32::{attach_parent_console, run, system_autostart};
