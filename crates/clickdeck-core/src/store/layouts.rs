use crate::utils::atomic_write;
use crate::{Error, Result};
use clickdeck_types::NamedLayout;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// Persistence of the whole named-layout collection.
pub trait LayoutRepository {
    /// Individually corrupt entries are skipped; a missing or unreadable
    /// file yields an empty collection.
    fn load_all(&self) -> Vec<NamedLayout>;

    /// Replace the persisted collection in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    fn save_all(&self, layouts: &[NamedLayout]) -> Result<()>;
}

/// Layouts stored as a JSON array in `layouts.json`.
#[derive(Debug, Clone)]
pub struct JsonLayoutStore {
    path: PathBuf,
}

impl JsonLayoutStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_entries(&self) -> Result<Vec<Value>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl LayoutRepository for JsonLayoutStore {
    fn load_all(&self) -> Vec<NamedLayout> {
        let entries = match self.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read layouts from {}: {e}", self.path.display());
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .enumerate()
            .filter_map(|(idx, entry)| match serde_json::from_value::<NamedLayout>(entry) {
                Ok(layout) => Some(layout.with_backfilled_defaults()),
                Err(e) => {
                    warn!("Skipping corrupt layout entry #{idx}: {e}");
                    None
                }
            })
            .collect()
    }

    fn save_all(&self, layouts: &[NamedLayout]) -> Result<()> {
        let content = serde_json::to_string_pretty(layouts)?;
        atomic_write(&self.path, &content)?;
        Ok(())
    }
}

/// Write one layout to a standalone file.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn export_layout(layout: &NamedLayout, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(layout)?;
    atomic_write(path, &content)?;
    Ok(())
}

/// Read one layout file, applying defaults for icon settings older files
/// lack or carry invalid values for.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a layout.
pub fn import_layout(path: &Path) -> Result<NamedLayout> {
    let content = std::fs::read_to_string(path)?;
    let layout: NamedLayout = serde_json::from_str(&content)?;
    Ok(layout.with_backfilled_defaults())
}

/// Name-addressed operations over a [`LayoutRepository`].
///
/// Names are unique ignoring case; uniqueness is checked on every write.
pub struct LayoutLibrary {
    repo: Box<dyn LayoutRepository>,
}

impl LayoutLibrary {
    pub fn new(repo: Box<dyn LayoutRepository>) -> Self {
        Self { repo }
    }

    /// All layouts, ordered by name ignoring case.
    #[must_use]
    pub fn list(&self) -> Vec<NamedLayout> {
        let mut layouts = self.repo.load_all();
        layouts.sort_by_key(|l| l.name.to_lowercase());
        layouts
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.list().into_iter().map(|l| l.name).collect()
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<NamedLayout> {
        self.repo
            .load_all()
            .into_iter()
            .find(|l| same_name(&l.name, name))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Store `layout`, replacing a same-named one only when `overwrite` is set.
    ///
    /// # Errors
    ///
    /// `InvalidLayoutName` for a blank name, `LayoutExists` on a collision
    /// without `overwrite`, or the repository's write error.
    pub fn save(&self, mut layout: NamedLayout, overwrite: bool) -> Result<()> {
        layout.name = validated_name(&layout.name)?;
        let mut layouts = self.repo.load_all();

        if let Some(pos) = position_of(&layouts, &layout.name) {
            if !overwrite {
                return Err(Error::LayoutExists(layouts[pos].name.clone()));
            }
            layouts.remove(pos);
        }

        info!("Saving layout '{}'", layout.name);
        layouts.push(layout);
        self.repo.save_all(&layouts)
    }

    /// # Errors
    ///
    /// `LayoutNotFound`, `InvalidLayoutName`, `LayoutExists` when another
    /// layout already uses the new name, or the repository's write error.
    pub fn rename(&self, old: &str, new: &str) -> Result<()> {
        let new = validated_name(new)?;
        let mut layouts = self.repo.load_all();
        let pos = position_of(&layouts, old).ok_or_else(|| Error::LayoutNotFound(old.to_string()))?;

        if let Some(other) = position_of(&layouts, &new)
            && other != pos
        {
            return Err(Error::LayoutExists(layouts[other].name.clone()));
        }

        layouts[pos].name = new;
        self.repo.save_all(&layouts)
    }

    /// # Errors
    ///
    /// `LayoutNotFound` or the repository's write error.
    pub fn delete(&self, name: &str) -> Result<()> {
        let mut layouts = self.repo.load_all();
        let pos = position_of(&layouts, name).ok_or_else(|| Error::LayoutNotFound(name.to_string()))?;
        let removed = layouts.remove(pos);
        info!("Deleting layout '{}'", removed.name);
        self.repo.save_all(&layouts)
    }

    /// # Errors
    ///
    /// `LayoutNotFound` or the export write error.
    pub fn export(&self, name: &str, path: &Path) -> Result<()> {
        let layout = self
            .find(name)
            .ok_or_else(|| Error::LayoutNotFound(name.to_string()))?;
        export_layout(&layout, path)
    }

    /// Import a layout file as a new entry with a fresh id. A clashing name
    /// gets a numeric suffix: "Work (2)", "Work (3)", ...
    ///
    /// # Errors
    ///
    /// Returns the read/parse error of the file or the repository's write error.
    pub fn import(&self, path: &Path) -> Result<NamedLayout> {
        let mut layout = import_layout(path)?;
        let mut layouts = self.repo.load_all();

        let base = validated_name(&layout.name).unwrap_or_else(|_| "Imported".to_string());
        layout.name = unique_name(&layouts, &base);
        layout.id = Uuid::new_v4();

        info!("Imported layout '{}' from {}", layout.name, path.display());
        layouts.push(layout.clone());
        self.repo.save_all(&layouts)?;
        Ok(layout)
    }
}

fn validated_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidLayoutName(name.to_string()));
    }
    Ok(trimmed.to_string())
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn position_of(layouts: &[NamedLayout], name: &str) -> Option<usize> {
    layouts.iter().position(|l| same_name(&l.name, name))
}

fn unique_name(layouts: &[NamedLayout], base: &str) -> String {
    if position_of(layouts, base).is_none() {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base} ({n})"))
        .find(|candidate| position_of(layouts, candidate).is_none())
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use clickdeck_types::{LauncherItem, Size};
    use tempfile::TempDir;

    fn layout(name: &str) -> NamedLayout {
        let items = vec![LauncherItem::new("A", "a.exe")];
        NamedLayout::capture(name, &items, Size::new(360.0, 260.0), 20.0, 10.0).unwrap()
    }

    fn library() -> (TempDir, LayoutLibrary, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layouts.json");
        let lib = LayoutLibrary::new(Box::new(JsonLayoutStore::new(path.clone())));
        (dir, lib, path)
    }

    #[test]
    fn test_load_all_missing_file_is_empty() {
        let (_dir, lib, _) = library();
        assert!(lib.list().is_empty());
    }

    #[test]
    fn test_load_all_skips_corrupt_entries() {
        let (_dir, lib, path) = library();
        let good = serde_json::to_value(layout("Good")).unwrap();
        let doc = serde_json::json!([good, {"name": 42}, {"nonsense": true}]);
        std::fs::write(&path, doc.to_string()).unwrap();

        let layouts = lib.list();
        assert_eq!(layouts.len(), 1);
        assert_eq!(layouts[0].name, "Good");
    }

    #[test]
    fn test_unreadable_file_is_empty() {
        let (_dir, lib, path) = library();
        std::fs::write(&path, "not json").unwrap();
        assert!(lib.list().is_empty());
    }

    #[test]
    fn test_save_detects_case_insensitive_collision() {
        let (_dir, lib, _) = library();
        lib.save(layout("Work"), false).unwrap();

        let err = lib.save(layout("work"), false).unwrap_err();
        assert!(matches!(err, Error::LayoutExists(ref n) if n == "Work"));

        lib.save(layout("WORK"), true).unwrap();
        let names = lib.names();
        assert_eq!(names, vec!["WORK".to_string()]);
    }

    #[test]
    fn test_save_rejects_blank_name() {
        let (_dir, lib, _) = library();
        let err = lib.save(layout("   "), false).unwrap_err();
        assert!(matches!(err, Error::InvalidLayoutName(_)));
    }

    #[test]
    fn test_list_sorted_by_name() {
        let (_dir, lib, _) = library();
        lib.save(layout("beta"), false).unwrap();
        lib.save(layout("Alpha"), false).unwrap();
        lib.save(layout("gamma"), false).unwrap();
        assert_eq!(lib.names(), vec!["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_rename() {
        let (_dir, lib, _) = library();
        lib.save(layout("Home"), false).unwrap();
        lib.save(layout("Work"), false).unwrap();

        assert!(matches!(lib.rename("Home", "work"), Err(Error::LayoutExists(_))));
        assert!(matches!(lib.rename("Home", ""), Err(Error::InvalidLayoutName(_))));
        assert!(matches!(lib.rename("Nope", "X"), Err(Error::LayoutNotFound(_))));

        // Case-only rename of itself is allowed
        lib.rename("home", "HOME").unwrap();
        lib.rename("HOME", "Desk").unwrap();
        assert_eq!(lib.names(), vec!["Desk", "Work"]);
    }

    #[test]
    fn test_delete() {
        let (_dir, lib, _) = library();
        lib.save(layout("Temp"), false).unwrap();
        lib.delete("temp").unwrap();
        assert!(lib.list().is_empty());
        assert!(matches!(lib.delete("temp"), Err(Error::LayoutNotFound(_))));
    }

    #[test]
    fn test_export_then_import_dedupes_name() {
        let (dir, lib, _) = library();
        let original = layout("Work");
        let original_id = original.id;
        lib.save(original, false).unwrap();

        let file = dir.path().join("work-export.json");
        lib.export("Work", &file).unwrap();

        let imported = lib.import(&file).unwrap();
        assert_eq!(imported.name, "Work (2)");
        assert_ne!(imported.id, original_id);
        assert_eq!(imported.item_count(), 1);

        let again = lib.import(&file).unwrap();
        assert_eq!(again.name, "Work (3)");
        assert_eq!(lib.list().len(), 3);
    }

    #[test]
    fn test_import_backfills_old_file() {
        let (dir, lib, _) = library();
        let file = dir.path().join("old.json");
        std::fs::write(
            &file,
            r#"{"name": "Old", "layoutJson": "[]", "iconSize": 0, "iconSpacing": -1}"#,
        )
        .unwrap();

        let imported = lib.import(&file).unwrap();
        assert_eq!(imported.icon_size, 20.0);
        assert_eq!(imported.icon_spacing, 10.0);
    }

    #[test]
    fn test_import_invalid_file_errors() {
        let (dir, lib, _) = library();
        let file = dir.path().join("bad.json");
        std::fs::write(&file, "[]").unwrap();
        assert!(lib.import(&file).is_err());
        assert!(lib.list().is_empty());
    }

    #[test]
    fn test_export_missing_layout() {
        let (dir, lib, _) = library();
        let err = lib.export("Ghost", &dir.path().join("g.json")).unwrap_err();
        assert!(matches!(err, Error::LayoutNotFound(_)));
    }
}
