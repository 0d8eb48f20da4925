use clickdeck_core::autostart::Autostart;
use clickdeck_core::config::Directories;

use crate::error::{DaemonError, Result};

const TRAY_UNSUPPORTED: &str = "the tray process requires Windows";
const AUTOSTART_UNSUPPORTED: &str = "start at login is only available on Windows";

/// # Errors
///
/// Always fails with [`DaemonError::Unsupported`].
pub fn run(_dirs: Directories) -> Result<()> {
    Err(DaemonError::Unsupported(TRAY_UNSUPPORTED))
}

/// # Errors
///
/// Always fails with [`DaemonError::Unsupported`].
pub fn system_autostart() -> Result<Box<dyn Autostart>> {
    Err(DaemonError::Unsupported(AUTOSTART_UNSUPPORTED))
}

/// Console output already goes to the terminal here.
pub fn attach_parent_console() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_is_unsupported() {
        let temp = tempfile::tempdir().unwrap();
        let err = run(Directories::with_base(temp.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, DaemonError::Unsupported(_)));
    }

    #[test]
    fn test_autostart_is_unsupported() {
        assert!(matches!(
            system_autostart(),
            Err(DaemonError::Unsupported(_))
        ));
    }
}
