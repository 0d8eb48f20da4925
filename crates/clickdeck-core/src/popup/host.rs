//! Seams between the popup controller and the windowing layer.

use crate::Result;
use clickdeck_types::{LauncherItem, Point, Rect, Size};
use std::path::{Path, PathBuf};

/// One realized overlay window.
pub trait PopupSurface {
    /// Show the window and give it input focus.
    fn show(&mut self);

    /// Destroy the window.
    fn close(&mut self);

    /// Request a repaint.
    fn invalidate(&mut self);

    /// Client area size, `None` until the layout is realized.
    fn canvas_size(&self) -> Option<Size>;

    fn set_capture(&mut self, captured: bool);

    fn set_size(&mut self, size: Size);

    /// Outer window rectangle in screen coordinates.
    fn frame(&self) -> Rect;

    /// Call back into [`super::PopupController::tick`] after `delay_ms`.
    fn schedule_tick(&mut self, delay_ms: u64);

    fn set_title(&mut self, title: &str);
}

/// Creates surfaces and runs the blocking dialogs the popup needs.
///
/// Dialog calls may pump messages; the controller marks itself modal for
/// their duration so deactivation does not close the popup underneath them.
pub trait PopupHost {
    /// # Errors
    ///
    /// Returns [`crate::Error::Surface`] when the window cannot be created.
    fn create_surface(&mut self, frame: Rect) -> Result<Box<dyn PopupSurface>>;

    /// Bounding rectangle of all monitors.
    fn virtual_screen(&self) -> Rect;

    fn confirm(&mut self, title: &str, message: &str) -> bool;

    fn prompt_text(&mut self, title: &str, initial: &str) -> Option<String>;

    /// Files chosen in an open-file dialog, empty when cancelled.
    fn pick_files(&mut self, title: &str) -> Vec<PathBuf>;

    /// Target of a `.lnk` shortcut, `None` when it cannot be read.
    fn resolve_shortcut(&self, path: &Path) -> Option<PathBuf>;

    /// Let the user edit a copy of `item`. `None` when cancelled.
    fn edit_item(&mut self, item: &LauncherItem) -> Option<LauncherItem>;

    fn report_error(&mut self, title: &str, message: &str);
}

/// Place a window of `size` with its top-left at `cursor`, shifted left/up
/// so it stays inside `screen`.
#[must_use]
pub fn place_frame(cursor: Point, size: Size, screen: Rect) -> Rect {
    let mut x = cursor.x;
    let mut y = cursor.y;
    if x + size.width > screen.right() {
        x = screen.right() - size.width;
    }
    if y + size.height > screen.bottom() {
        y = screen.bottom() - size.height;
    }
    Rect::new(x.max(screen.x), y.max(screen.y), size.width, size.height)
}
