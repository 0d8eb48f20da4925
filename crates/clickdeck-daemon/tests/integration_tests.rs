//! Integration tests for the `layouts` and `autostart` subcommands.
//!
//! Each test runs against a throwaway config directory, the same way
//! `--config-dir` points the binary at one.

#![allow(clippy::cast_precision_loss)] // small loop indices as coordinates

use std::cell::Cell;

use clickdeck_core::autostart::Autostart;
use clickdeck_core::config::{Config, Directories};
use clickdeck_daemon::DaemonError;
use clickdeck_daemon::cli::{AutostartCommand, LayoutsCommand, layout_library, run_autostart, run_layouts};
use clickdeck_types::{LauncherItem, NamedLayout, Size};
use tempfile::TempDir;

fn temp_dirs() -> (TempDir, Directories) {
    let tmp = TempDir::new().unwrap();
    let dirs = Directories::with_base(tmp.path().to_path_buf());
    dirs.ensure_exists().unwrap();
    (tmp, dirs)
}

fn save_layout(dirs: &Directories, name: &str, count: usize) {
    let items: Vec<LauncherItem> = (0..count)
        .map(|i| {
            LauncherItem::new(format!("App {i}"), format!("C:\\Apps\\app{i}.exe"))
                .with_position(10.0 + 30.0 * i as f64, 10.0)
        })
        .collect();
    let layout = NamedLayout::capture(name, &items, Size::new(360.0, 260.0), 20.0, 10.0).unwrap();
    layout_library(dirs).save(layout, false).unwrap();
}

fn run(dirs: &Directories, command: &LayoutsCommand) -> Result<String, DaemonError> {
    let mut out = Vec::new();
    run_layouts(dirs, command, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn test_list_without_layouts() {
    let (_tmp, dirs) = temp_dirs();
    let output = run(&dirs, &LayoutsCommand::List).unwrap();
    assert_eq!(output, "No saved layouts\n");
}

#[test]
fn test_list_sorted_by_name() {
    let (_tmp, dirs) = temp_dirs();
    save_layout(&dirs, "work", 3);
    save_layout(&dirs, "Home", 2);

    let output = run(&dirs, &LayoutsCommand::List).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Home "));
    assert!(lines[0].contains("  2 items  360x260"));
    assert!(lines[0].ends_with("20px / 10px"));
    assert!(lines[1].starts_with("work "));
    assert!(lines[1].contains("  3 items"));
}

#[test]
fn test_export_then_import_dedupes_name() {
    let (tmp, dirs) = temp_dirs();
    save_layout(&dirs, "Work", 2);
    let file = tmp.path().join("work-layout.json");

    let output = run(
        &dirs,
        &LayoutsCommand::Export {
            name: "work".to_string(),
            file: file.clone(),
        },
    )
    .unwrap();
    assert!(output.starts_with("Exported 'work' to "));
    assert!(file.exists());

    let output = run(&dirs, &LayoutsCommand::Import { file }).unwrap();
    assert_eq!(output, "Imported 'Work (2)'\n");

    let library = layout_library(&dirs);
    assert_eq!(library.names(), vec!["Work", "Work (2)"]);
    let imported = library.find("Work (2)").unwrap();
    assert_eq!(imported.item_count(), 2);
    assert_ne!(imported.id, library.find("Work").unwrap().id);
}

#[test]
fn test_import_into_other_profile_keeps_name() {
    let (tmp, source) = temp_dirs();
    save_layout(&source, "Travel", 1);
    let file = tmp.path().join("travel.json");
    layout_library(&source).export("Travel", &file).unwrap();

    let (_other_tmp, target) = temp_dirs();
    let output = run(&target, &LayoutsCommand::Import { file }).unwrap();
    assert_eq!(output, "Imported 'Travel'\n");
    assert_eq!(layout_library(&target).names(), vec!["Travel"]);
}

#[test]
fn test_delete_unknown_layout() {
    let (_tmp, dirs) = temp_dirs();
    let err = run(
        &dirs,
        &LayoutsCommand::Delete {
            name: "Missing".to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        DaemonError::Core(clickdeck_core::Error::LayoutNotFound(ref name)) if name == "Missing"
    ));
}

#[test]
fn test_delete_layout() {
    let (_tmp, dirs) = temp_dirs();
    save_layout(&dirs, "Old", 1);
    save_layout(&dirs, "Keep", 1);

    let output = run(
        &dirs,
        &LayoutsCommand::Delete {
            name: "old".to_string(),
        },
    )
    .unwrap();
    assert_eq!(output, "Deleted 'old'\n");
    assert_eq!(layout_library(&dirs).names(), vec!["Keep"]);
}

#[test]
fn test_rename_layout() {
    let (_tmp, dirs) = temp_dirs();
    save_layout(&dirs, "Work", 1);

    let output = run(
        &dirs,
        &LayoutsCommand::Rename {
            old: "Work".to_string(),
            new: "  Office ".to_string(),
        },
    )
    .unwrap();
    assert_eq!(output, "Renamed 'Work' to '  Office '\n");
    assert_eq!(layout_library(&dirs).names(), vec!["Office"]);
}

#[test]
fn test_rename_onto_existing_name_fails() {
    let (_tmp, dirs) = temp_dirs();
    save_layout(&dirs, "Work", 1);
    save_layout(&dirs, "Home", 1);

    let err = run(
        &dirs,
        &LayoutsCommand::Rename {
            old: "Work".to_string(),
            new: "HOME".to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        DaemonError::Core(clickdeck_core::Error::LayoutExists(ref name)) if name == "Home"
    ));
    assert_eq!(layout_library(&dirs).names(), vec!["Home", "Work"]);
}

/// In-memory stand-in for the Run key.
#[derive(Default)]
struct FakeAutostart {
    registered: Cell<bool>,
    writes: Cell<usize>,
}

impl Autostart for FakeAutostart {
    fn is_registered(&self) -> clickdeck_core::Result<bool> {
        Ok(self.registered.get())
    }

    fn register(&self) -> clickdeck_core::Result<()> {
        self.registered.set(true);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn unregister(&self) -> clickdeck_core::Result<()> {
        self.registered.set(false);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

fn autostart(fake: &FakeAutostart, dirs: &Directories, command: AutostartCommand) -> String {
    let mut out = Vec::new();
    run_autostart(fake, dirs, command, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_autostart_enable_status_disable() {
    let (_tmp, dirs) = temp_dirs();
    let fake = FakeAutostart::default();

    assert_eq!(
        autostart(&fake, &dirs, AutostartCommand::Status),
        "Start at login: disabled\n"
    );

    assert_eq!(
        autostart(&fake, &dirs, AutostartCommand::Enable),
        "Start at login: enabled\n"
    );
    assert!(fake.registered.get());
    assert!(Config::load(&dirs.config_file).unwrap().behavior.launch_on_startup);

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&dirs.config_file).unwrap()).unwrap();
    assert_eq!(raw["behavior"]["launchOnStartup"], serde_json::json!(true));

    assert_eq!(
        autostart(&fake, &dirs, AutostartCommand::Status),
        "Start at login: enabled\n"
    );

    assert_eq!(
        autostart(&fake, &dirs, AutostartCommand::Disable),
        "Start at login: disabled\n"
    );
    assert!(!fake.registered.get());
    assert!(!Config::load(&dirs.config_file).unwrap().behavior.launch_on_startup);
}

#[test]
fn test_autostart_enable_is_idempotent() {
    let (_tmp, dirs) = temp_dirs();
    let fake = FakeAutostart::default();

    autostart(&fake, &dirs, AutostartCommand::Enable);
    autostart(&fake, &dirs, AutostartCommand::Enable);
    assert_eq!(fake.writes.get(), 1);
}

#[test]
fn test_autostart_status_leaves_config_untouched() {
    let (_tmp, dirs) = temp_dirs();
    let fake = FakeAutostart::default();

    autostart(&fake, &dirs, AutostartCommand::Status);
    assert!(!dirs.config_file.exists());
}
