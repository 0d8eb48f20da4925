//! Turning a launcher item into a process launch.

use crate::{Error, Result};
use clickdeck_types::LauncherItem;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

static ENV_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%([A-Za-z_][A-Za-z0-9_()]*)%").expect("valid env token pattern")
});

/// Expand `%NAME%` tokens from the environment. Unknown names stay as written.
#[must_use]
pub fn expand_env_vars(input: &str) -> String {
    if !input.contains('%') {
        return input.to_string();
    }
    ENV_TOKEN
        .replace_all(input, |caps: &regex::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// A fully expanded launch, ready for the platform launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub executable: String,
    pub arguments: String,
    pub working_directory: Option<PathBuf>,
}

/// Expand the item's fields and pick a working directory.
///
/// Returns `Ok(None)` for a `NO_ACTION` placeholder. The working directory
/// is the configured one if it exists, else the executable's own directory
/// if that exists, else unset.
///
/// # Errors
///
/// Returns `Error::Launch` when the item has no executable path.
pub fn prepare_launch(item: &LauncherItem) -> Result<Option<LaunchRequest>> {
    if item.is_placeholder() {
        debug!("'{}' is a placeholder, nothing to launch", item.display_name);
        return Ok(None);
    }
    if item.executable_path.trim().is_empty() {
        return Err(Error::Launch(format!(
            "Executable path is not configured for '{}'",
            item.display_name
        )));
    }

    let executable = expand_env_vars(item.executable_path.trim());
    let arguments = expand_env_vars(&item.arguments);

    let configured = Some(item.working_directory.trim())
        .filter(|dir| !dir.is_empty())
        .map(|dir| PathBuf::from(expand_env_vars(dir)))
        .filter(|dir| dir.is_dir());
    let working_directory = configured.or_else(|| {
        Path::new(&executable)
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty() && dir.is_dir())
            .map(Path::to_path_buf)
    });

    Ok(Some(LaunchRequest {
        executable,
        arguments,
        working_directory,
    }))
}

/// Starts processes and reveals files for the popup.
pub trait ProcessLauncher {
    /// # Errors
    ///
    /// Returns `Error::Launch` when the process cannot be started.
    fn launch(&self, request: &LaunchRequest) -> Result<()>;

    /// Show `path` selected in the system file manager.
    ///
    /// # Errors
    ///
    /// Returns `Error::Launch` when the file manager cannot be started.
    fn reveal(&self, path: &Path) -> Result<()>;
}

/// Launch `item` through `launcher`. A placeholder is a successful no-op.
///
/// # Errors
///
/// Propagates preparation and launcher errors.
pub fn launch_item(launcher: &dyn ProcessLauncher, item: &LauncherItem) -> Result<bool> {
    let Some(request) = prepare_launch(item)? else {
        return Ok(false);
    };
    info!("Launching '{}' ({})", item.display_name, request.executable);
    launcher.launch(&request)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clickdeck_types::NO_ACTION;
    use std::cell::RefCell;

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: test-only variable with a unique name
        unsafe { std::env::set_var("CLICKDECK_TEST_ROOT", "/opt/cd") };
        assert_eq!(expand_env_vars("%CLICKDECK_TEST_ROOT%/bin"), "/opt/cd/bin");
        assert_eq!(expand_env_vars("%CLICKDECK_UNSET_VAR%/x"), "%CLICKDECK_UNSET_VAR%/x");
        assert_eq!(expand_env_vars("100% sure"), "100% sure");
    }

    #[test]
    fn test_placeholder_is_noop() {
        let item = LauncherItem::new("Nothing", NO_ACTION);
        assert_eq!(prepare_launch(&item).unwrap(), None);
    }

    #[test]
    fn test_empty_executable_errors() {
        let item = LauncherItem::new("Broken", "  ");
        assert!(matches!(prepare_launch(&item), Err(Error::Launch(_))));
    }

    #[test]
    fn test_working_directory_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("tool.exe");
        std::fs::write(&exe, b"").unwrap();

        let mut item = LauncherItem::new("Tool", exe.to_string_lossy());
        item.working_directory = "/definitely/not/here".to_string();
        let req = prepare_launch(&item).unwrap().unwrap();
        assert_eq!(req.working_directory.as_deref(), Some(dir.path()));

        let other = tempfile::tempdir().unwrap();
        item.working_directory = other.path().to_string_lossy().into_owned();
        let req = prepare_launch(&item).unwrap().unwrap();
        assert_eq!(req.working_directory.as_deref(), Some(other.path()));
    }

    #[test]
    fn test_bare_executable_has_no_working_directory() {
        let item = LauncherItem::new("Calc", "calc.exe");
        let req = prepare_launch(&item).unwrap().unwrap();
        assert_eq!(req.working_directory, None);
        assert_eq!(req.executable, "calc.exe");
    }

    #[derive(Default)]
    struct Recorder {
        launched: RefCell<Vec<LaunchRequest>>,
    }

    impl ProcessLauncher for Recorder {
        fn launch(&self, request: &LaunchRequest) -> Result<()> {
            self.launched.borrow_mut().push(request.clone());
            Ok(())
        }

        fn reveal(&self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_launch_item_skips_placeholder() {
        let recorder = Recorder::default();
        assert!(!launch_item(&recorder, &LauncherItem::new("N", NO_ACTION)).unwrap());
        assert!(launch_item(&recorder, &LauncherItem::new("C", "calc.exe")).unwrap());
        assert_eq!(recorder.launched.borrow().len(), 1);
    }
}
