use crate::Result;
use crate::config::{Config, Directories, WindowGeometry};
use crate::utils::atomic_write;
use clickdeck_types::LauncherItem;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Durable home of the launcher items and the popup geometry.
///
/// The infallible methods never surface errors: failures are logged and the
/// previously persisted state stays untouched.
pub trait LauncherStore {
    /// Empty on a missing or unreadable file.
    fn load_items(&self) -> Vec<LauncherItem>;

    fn save_items(&self, items: &[LauncherItem]);

    fn save_window_geometry(&self, geometry: WindowGeometry);
}

/// Items in `items.json`, geometry in the `window` section of `config.json`.
#[derive(Debug, Clone)]
pub struct JsonItemStore {
    items_file: PathBuf,
    config_file: PathBuf,
}

impl JsonItemStore {
    #[must_use]
    pub fn new(dirs: &Directories) -> Self {
        Self {
            items_file: dirs.items_file.clone(),
            config_file: dirs.config_file.clone(),
        }
    }

    /// Read the persisted items.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn try_load_items(&self) -> Result<Vec<LauncherItem>> {
        if !self.items_file.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.items_file)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut items: Vec<LauncherItem> = serde_json::from_str(&content)?;
        for item in &mut items {
            item.sanitize_position();
        }
        Ok(items)
    }

    /// Replace the persisted items.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn try_save_items(&self, items: &[LauncherItem]) -> Result<()> {
        let content = serde_json::to_string_pretty(items)?;
        atomic_write(&self.items_file, &content)?;
        Ok(())
    }

    /// Update only the `window` section of the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be read, parsed or written.
    pub fn try_save_window_geometry(&self, geometry: WindowGeometry) -> Result<()> {
        let mut config = Config::load(&self.config_file)?;
        if config.window == geometry {
            return Ok(());
        }
        config.window = geometry;
        config.save(&self.config_file)
    }
}

impl LauncherStore for JsonItemStore {
    fn load_items(&self) -> Vec<LauncherItem> {
        match self.try_load_items() {
            Ok(items) => {
                debug!("Loaded {} launcher items", items.len());
                items
            }
            Err(e) => {
                warn!("Failed to load launcher items from {}: {e}", self.items_file.display());
                Vec::new()
            }
        }
    }

    fn save_items(&self, items: &[LauncherItem]) {
        if let Err(e) = self.try_save_items(items) {
            warn!("Failed to save launcher items to {}: {e}", self.items_file.display());
        }
    }

    fn save_window_geometry(&self, geometry: WindowGeometry) {
        if let Err(e) = self.try_save_window_geometry(geometry) {
            warn!("Failed to save window geometry: {e}");
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, JsonItemStore, Directories) {
        let dir = TempDir::new().unwrap();
        let dirs = Directories::with_base(dir.path().to_path_buf());
        (dir, JsonItemStore::new(&dirs), dirs)
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let (_dir, store, _) = store();
        assert!(store.load_items().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let (_dir, store, _) = store();
        let mut items = vec![
            LauncherItem::new("Notepad", "notepad.exe").with_position(10.0, 50.0),
            LauncherItem::new("Calc", "calc.exe"),
        ];
        items[0].is_selected = true;
        store.save_items(&items);

        let loaded = store.load_items();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, items[0].id);
        assert_eq!(loaded[0].y, 50.0);
        assert!(!loaded[0].is_selected);
    }

    #[test]
    fn test_corrupt_file_loads_empty_and_keeps_file() {
        let (_dir, store, dirs) = store();
        std::fs::write(&dirs.items_file, "[{broken").unwrap();

        assert!(store.try_load_items().is_err());
        assert!(store.load_items().is_empty());
        assert_eq!(std::fs::read_to_string(&dirs.items_file).unwrap(), "[{broken");
    }

    #[test]
    fn test_save_window_geometry_updates_config_only() {
        let (_dir, store, dirs) = store();
        let mut config = Config::default();
        config.behavior.double_click_ms = 333;
        config.save(&dirs.config_file).unwrap();

        store.save_window_geometry(WindowGeometry {
            width: 500.0,
            height: 300.0,
            last_x: 40.0,
            last_y: 60.0,
        });

        let reloaded = Config::load(&dirs.config_file).unwrap();
        assert_eq!(reloaded.window.width, 500.0);
        assert_eq!(reloaded.window.last_y, 60.0);
        assert_eq!(reloaded.behavior.double_click_ms, 333);
    }

    #[test]
    fn test_save_window_geometry_leaves_broken_config_alone() {
        let (_dir, store, dirs) = store();
        std::fs::write(&dirs.config_file, "{oops").unwrap();
        store.save_window_geometry(WindowGeometry::default());
        assert_eq!(std::fs::read_to_string(&dirs.config_file).unwrap(), "{oops");
    }
}
