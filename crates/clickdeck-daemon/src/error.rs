//! Error types for the clickdeck daemon.

/// Errors that can occur in the daemon
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] clickdeck_core::Error),

    /// File watcher error
    #[error("Watcher error: {0}")]
    Watcher(#[from] notify::Error),

    /// Feature not available on this platform
    #[error("Unsupported: {0}")]
    Unsupported(&'static str),
}

pub type Result<T> = std::result::Result<T, DaemonError>;
