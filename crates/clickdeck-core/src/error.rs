use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Hook error (code {code}): {message}")]
    Hook { code: u32, message: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Launch error: {0}")]
    Launch(String),

    #[error("Autostart error: {0}")]
    Autostart(String),

    #[error("Icon error: {0}")]
    Icon(String),

    #[error("Layout not found: {0}")]
    LayoutNotFound(String),

    #[error("Layout already exists: {0}")]
    LayoutExists(String),

    #[error("Invalid layout name: {0:?}")]
    InvalidLayoutName(String),

    #[error("Surface error: {0}")]
    Surface(String),
}

/// Rejections raised by the item editor before an item is committed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Display name cannot be empty")]
    EmptyDisplayName,

    #[error("Executable path cannot be empty")]
    EmptyExecutablePath,

    #[error("Executable not found: {0}")]
    ExecutableNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
