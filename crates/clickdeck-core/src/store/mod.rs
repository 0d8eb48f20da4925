//! Durable storage of launcher items and named layouts.

mod items;
mod layouts;

pub use items::{JsonItemStore, LauncherStore};
pub use layouts::{JsonLayoutStore, LayoutLibrary, LayoutRepository, export_layout, import_layout};
