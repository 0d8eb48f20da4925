//! Rules the item editor applies before committing an add or edit.

use crate::ValidationError;
use crate::launch::expand_env_vars;
use clickdeck_types::{LauncherItem, Point};
use std::path::Path;

/// Vertical gap between the lowest item and a newly added one.
pub const NEW_ITEM_OFFSET: f64 = 40.0;

/// Left edge and top of the first item on an empty canvas.
pub const NEW_ITEM_ORIGIN: f64 = 10.0;

/// Check an edited item before it is committed.
///
/// `NO_ACTION` placeholders skip the existence check. Other executables are
/// checked after environment expansion.
///
/// # Errors
///
/// Returns the first rule the item breaks.
pub fn validate_item(item: &LauncherItem) -> Result<(), ValidationError> {
    if item.display_name.trim().is_empty() {
        return Err(ValidationError::EmptyDisplayName);
    }

    let exe = item.executable_path.trim();
    if exe.is_empty() {
        return Err(ValidationError::EmptyExecutablePath);
    }
    if item.is_placeholder() {
        return Ok(());
    }

    let expanded = expand_env_vars(exe);
    if !Path::new(&expanded).exists() {
        return Err(ValidationError::ExecutableNotFound(expanded));
    }
    Ok(())
}

/// Where a newly added item goes: below the lowest existing one.
#[must_use]
pub fn next_item_position(items: &[LauncherItem]) -> Point {
    items
        .iter()
        .map(|item| item.y)
        .filter(|y| y.is_finite())
        .reduce(f64::max)
        .map_or(Point::new(NEW_ITEM_ORIGIN, NEW_ITEM_ORIGIN), |max_y| {
            Point::new(NEW_ITEM_ORIGIN, max_y + NEW_ITEM_OFFSET)
        })
}

#[must_use]
pub fn is_shortcut(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("lnk"))
}

/// Item for a file the user picked.
///
/// A shortcut whose target still exists launches that target and keeps the
/// shortcut as its icon. Otherwise the shortcut itself is launched, marked
/// in its name.
#[must_use]
pub fn item_from_file(path: &Path, shortcut_target: Option<&Path>) -> LauncherItem {
    let mut item = LauncherItem::from_path(path);
    if is_shortcut(path) {
        match shortcut_target.filter(|target| target.exists()) {
            Some(target) => item.executable_path = target.to_string_lossy().into_owned(),
            None => item.display_name.push_str(" (Shortcut)"),
        }
    }
    item
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use clickdeck_types::NO_ACTION;

    #[test]
    fn test_rejects_blank_fields() {
        assert_eq!(
            validate_item(&LauncherItem::new("  ", "a.exe")),
            Err(ValidationError::EmptyDisplayName)
        );
        assert_eq!(
            validate_item(&LauncherItem::new("App", "")),
            Err(ValidationError::EmptyExecutablePath)
        );
    }

    #[test]
    fn test_placeholder_needs_no_file() {
        assert!(validate_item(&LauncherItem::new("Spacer", NO_ACTION)).is_ok());
    }

    #[test]
    fn test_executable_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("tool.exe");
        let item = LauncherItem::new("Tool", exe.to_string_lossy());
        assert!(matches!(
            validate_item(&item),
            Err(ValidationError::ExecutableNotFound(_))
        ));

        std::fs::write(&exe, b"").unwrap();
        assert!(validate_item(&item).is_ok());
    }

    #[test]
    fn test_next_position() {
        assert_eq!(next_item_position(&[]), Point::new(10.0, 10.0));

        let items = vec![
            LauncherItem::new("a", "a").with_position(90.0, 50.0),
            LauncherItem::new("b", "b").with_position(10.0, 130.0),
        ];
        assert_eq!(next_item_position(&items), Point::new(10.0, 170.0));
    }

    #[test]
    fn test_item_from_plain_file() {
        let item = item_from_file(Path::new("tools/grep.exe"), None);
        assert_eq!(item.display_name, "grep");
        assert_eq!(item.executable_path, "tools/grep.exe");
        assert_eq!(item.icon_path, item.executable_path);
    }

    #[test]
    fn test_shortcut_launches_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("editor.exe");
        std::fs::write(&target, b"").unwrap();
        let link = dir.path().join("My Editor.LNK");

        let item = item_from_file(&link, Some(&target));
        assert_eq!(item.display_name, "My Editor");
        assert_eq!(item.executable_path, target.to_string_lossy());
        assert_eq!(item.icon_path, link.to_string_lossy());
    }

    #[test]
    fn test_broken_shortcut_launches_itself() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("Old.lnk");
        let gone = dir.path().join("gone.exe");

        for target in [None, Some(gone.as_path())] {
            let item = item_from_file(&link, target);
            assert_eq!(item.display_name, "Old (Shortcut)");
            assert_eq!(item.executable_path, link.to_string_lossy());
        }
    }
}
