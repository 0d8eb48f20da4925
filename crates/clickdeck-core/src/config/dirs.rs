use directories::ProjectDirs;
use std::path::PathBuf;

/// Application directories (roaming config and local data on Windows)
#[derive(Debug, Clone)]
pub struct Directories {
    /// Config directory (%APPDATA%\clickdeck\config)
    pub config: PathBuf,

    /// Data directory (%LOCALAPPDATA%\clickdeck\data)
    pub data: PathBuf,

    /// Settings file path
    pub config_file: PathBuf,

    /// Persisted launcher items
    pub items_file: PathBuf,

    /// Persisted named layouts
    pub layouts_file: PathBuf,

    /// Rolling log files
    pub logs: PathBuf,
}

impl Directories {
    /// Create a new `Directories` instance with the platform's standard paths.
    ///
    /// # Panics
    ///
    /// Panics if the system's project directories cannot be determined.
    #[must_use]
    pub fn new() -> Self {
        let project = ProjectDirs::from("", "", "clickdeck")
            .expect("Failed to determine project directories");

        let config = project.config_dir().to_path_buf();
        let data = project.data_local_dir().to_path_buf();

        Self {
            config_file: config.join("config.json"),
            items_file: config.join("items.json"),
            layouts_file: config.join("layouts.json"),
            logs: data.join("logs"),
            config,
            data,
        }
    }

    #[must_use]
    pub fn with_base(base: PathBuf) -> Self {
        Self {
            config_file: base.join("config.json"),
            items_file: base.join("items.json"),
            layouts_file: base.join("layouts.json"),
            logs: base.join("logs"),
            config: base.clone(),
            data: base,
        }
    }

    /// Ensure all directories exist.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be created.
    pub fn ensure_exists(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config)?;
        std::fs::create_dir_all(&self.data)?;
        std::fs::create_dir_all(&self.logs)?;
        Ok(())
    }
}

impl Default for Directories {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_sets_all_paths() {
        let base = PathBuf::from("/tmp/test-clickdeck");
        let dirs = Directories::with_base(base.clone());

        assert_eq!(dirs.config, base);
        assert_eq!(dirs.data, base);
        assert_eq!(dirs.config_file, base.join("config.json"));
        assert_eq!(dirs.items_file, base.join("items.json"));
        assert_eq!(dirs.layouts_file, base.join("layouts.json"));
        assert_eq!(dirs.logs, base.join("logs"));
    }

    #[test]
    fn test_ensure_exists_creates_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let base = temp_dir.path().join("clickdeck-test-subdir");
        let dirs = Directories::with_base(base);

        assert!(!dirs.logs.exists());

        dirs.ensure_exists().unwrap();

        assert!(dirs.config.exists());
        assert!(dirs.data.exists());
        assert!(dirs.logs.exists());
    }

    #[test]
    fn test_ensure_exists_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dirs = Directories::with_base(temp_dir.path().to_path_buf());

        dirs.ensure_exists().unwrap();
        dirs.ensure_exists().unwrap();

        assert!(dirs.config.exists());
    }

    #[test]
    fn test_new_returns_project_paths() {
        let dirs = Directories::new();

        assert!(dirs.config.to_string_lossy().contains("clickdeck"));
        assert!(dirs.data.to_string_lossy().contains("clickdeck"));
        assert!(dirs.config_file.to_string_lossy().ends_with("config.json"));
        assert!(dirs.items_file.to_string_lossy().ends_with("items.json"));
    }

    #[test]
    fn test_default_same_as_new() {
        let default_dirs = Directories::default();
        let new_dirs = Directories::new();

        assert_eq!(default_dirs.config, new_dirs.config);
        assert_eq!(default_dirs.data, new_dirs.data);
        assert_eq!(default_dirs.layouts_file, new_dirs.layouts_file);
    }
}
