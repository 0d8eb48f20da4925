//! Keyboard shortcuts, context menus and the commands behind them.

use super::{CloseReason, PopupController};
use crate::editor::{is_shortcut, item_from_file, next_item_position, validate_item};
use crate::launch::{expand_env_vars, launch_item};
use crate::session::layout::{
    align_to_grid, rescale_positions, snap_all_to_grid, stack_horizontal, stack_vertical,
};
use crate::session::{CanvasBounds, GridMetrics, SelectionSet};
use crate::{Error, Result};
use clickdeck_types::{ItemId, LauncherItem, ModifierState, NamedLayout, Point};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Keys the popup reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Delete,
    A,
    Y,
    Z,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemAction {
    Launch,
    /// Reveal the executable in the file manager
    OpenLocation,
    /// Edit the item's name, command line and icon
    Properties,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundAction {
    /// Pick files and append an item for each
    AddItems,
    AlignToGrid,
    StackVertical,
    StackHorizontal,
    SnapAllToGrid,
    Undo,
    Redo,
    SelectAll,
    SaveLayoutAs,
    LoadLayout(String),
    Close,
}

/// What the host should show for a right-click on the canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextMenu {
    Item {
        id: ItemId,
    },
    Background {
        can_undo: bool,
        can_redo: bool,
        layouts: Vec<String>,
    },
}

impl PopupController {
    /// Returns true when the key was handled.
    pub fn key_down(&mut self, key: Key, modifiers: ModifierState) -> bool {
        match (key, modifiers.ctrl) {
            (Key::Escape, _) => {
                let dragging = self.session.as_ref().is_some_and(|s| s.drag.is_active());
                if dragging {
                    self.capture_lost();
                } else {
                    self.close(CloseReason::Escape);
                }
                true
            }
            (Key::Z, true) => self.undo(),
            (Key::Y, true) => self.redo(),
            (Key::A, true) => {
                self.select_all();
                true
            }
            (Key::Delete, _) => self.remove_selected(),
            _ => false,
        }
    }

    pub fn undo(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.drag.is_active() {
            return false;
        }
        let applied = session.history.undo(&mut session.items);
        if applied {
            session.surface.invalidate();
        }
        applied
    }

    pub fn redo(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.drag.is_active() {
            return false;
        }
        let applied = session.history.redo(&mut session.items);
        if applied {
            session.surface.invalidate();
        }
        applied
    }

    pub fn select_all(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.selection.select_all(&mut session.items);
            session.surface.invalidate();
        }
    }

    /// Menu for a right-click at `pos`, or `None` when one must not open.
    ///
    /// Right-clicking an unselected item selects just that item first.
    pub fn context_menu_request(&mut self, pos: Point) -> Option<ContextMenu> {
        let tile = self.tile_size();
        let session = self.session.as_mut()?;
        if session.drag.is_active() {
            debug!("Context menu ignored: drag in progress");
            return None;
        }

        match session.hit_test(pos, tile) {
            Some(id) => {
                if !session.selection.contains(id) {
                    session.selection.select_only(&mut session.items, id);
                    session.surface.invalidate();
                }
                Some(ContextMenu::Item { id })
            }
            None => Some(ContextMenu::Background {
                can_undo: session.history.can_undo(),
                can_redo: session.history.can_redo(),
                layouts: self.services.layouts.names(),
            }),
        }
    }

    pub fn item_action(&mut self, id: ItemId, action: ItemAction) {
        match action {
            ItemAction::Launch => self.launch(id),
            ItemAction::OpenLocation => self.open_location(id),
            ItemAction::Properties => self.edit_properties(id),
            ItemAction::Remove => {
                if let Some(session) = self.session.as_mut()
                    && !session.selection.contains(id)
                {
                    session.selection.select_only(&mut session.items, id);
                }
                self.remove_selected();
            }
        }
    }

    pub fn background_action(&mut self, action: BackgroundAction) {
        match action {
            BackgroundAction::AddItems => self.add_picked_files(),
            BackgroundAction::AlignToGrid => self.apply_layout("align to grid", align_to_grid),
            BackgroundAction::StackVertical => self.apply_layout("stack vertical", stack_vertical),
            BackgroundAction::StackHorizontal => {
                self.apply_layout("stack horizontal", stack_horizontal);
            }
            BackgroundAction::SnapAllToGrid => self.apply_layout("snap to grid", snap_all_to_grid),
            BackgroundAction::Undo => {
                self.undo();
            }
            BackgroundAction::Redo => {
                self.redo();
            }
            BackgroundAction::SelectAll => self.select_all(),
            BackgroundAction::SaveLayoutAs => self.prompt_save_layout(),
            BackgroundAction::LoadLayout(name) => {
                if let Err(e) = self.load_layout(&name) {
                    self.report_error("Load layout failed", &e);
                }
            }
            BackgroundAction::Close => {
                self.close(CloseReason::Requested);
            }
        }
    }

    /// Run one bulk layout operation. Not undoable: the history is cleared
    /// and the result persisted.
    fn apply_layout(&mut self, what: &str, op: fn(&mut [LauncherItem], &CanvasBounds)) {
        let Some(bounds) = self.bounds() else {
            debug!("{what} ignored: canvas not realized");
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };

        op(&mut session.items, &bounds);
        session.history.clear();
        self.services.store.save_items(&session.items);
        session.surface.invalidate();
        info!("Applied {what} to {} items", session.items.len());
    }

    /// Launch `id`, closing the popup afterwards when configured to.
    pub(super) fn launch(&mut self, id: ItemId) {
        let Some(item) = self.session.as_ref().and_then(|s| s.item(id)).cloned() else {
            debug!("Launch ignored: item {id} is gone");
            return;
        };

        match launch_item(self.services.launcher.as_ref(), &item) {
            Ok(true) => {
                if self.config.behavior.close_on_launch {
                    self.close(CloseReason::Launched);
                }
            }
            Ok(false) => {}
            Err(e) => self.report_error("Launch failed", &e),
        }
    }

    fn open_location(&mut self, id: ItemId) {
        let Some(item) = self.session.as_ref().and_then(|s| s.item(id)).cloned() else {
            return;
        };
        if item.is_placeholder() {
            return;
        }

        let path = PathBuf::from(expand_env_vars(item.executable_path.trim()));
        let target = if path.exists() {
            Some(path.clone())
        } else {
            path.parent().filter(|dir| dir.is_dir()).map(Path::to_path_buf)
        };
        let result = match target {
            Some(target) => self.services.launcher.reveal(&target),
            None => Err(Error::Launch(format!("{} does not exist", path.display()))),
        };
        if let Err(e) = result {
            self.report_error("Open file location failed", &e);
        }
    }

    /// Remove every selected item after the host confirms.
    ///
    /// Clears the history and the selection and persists the remaining
    /// items. Returns true if anything was removed.
    pub fn remove_selected(&mut self) -> bool {
        let count = match &self.session {
            Some(session) if !session.selection.is_empty() => session.selection.len(),
            _ => return false,
        };
        let message = if count == 1 {
            "Remove the selected item?".to_string()
        } else {
            format!("Remove {count} selected items?")
        };
        if !self.with_modal(|host| host.confirm("Remove items", &message)) {
            return false;
        }

        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let removed = std::mem::replace(&mut session.selection, SelectionSet::new());
        session.items.retain(|item| !removed.contains(item.id));
        if let Some(pending) = session.pending_launch
            && removed.contains(pending.id)
        {
            session.pending_launch = None;
        }
        session.history.clear();
        session.clicks.reset();
        session.hovered = None;
        self.services.store.save_items(&session.items);
        session.surface.invalidate();
        info!("Removed {count} items");
        true
    }

    /// Validate `item` and append it below the existing ones.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when the item is rejected, or
    /// `Error::Surface` when no popup is open.
    pub fn add_item(&mut self, mut item: LauncherItem) -> Result<ItemId> {
        validate_item(&item)?;
        let bounds = self.bounds();
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| Error::Surface("popup is not open".to_string()))?;

        let pos = next_item_position(&session.items);
        item.set_position(bounds.map_or(pos, |b| b.clamp(pos)));
        item.is_selected = false;
        let id = item.id;
        info!("Added '{}'", item.display_name);
        session.items.push(item);
        self.services.store.save_items(&session.items);
        session.surface.invalidate();
        Ok(id)
    }

    fn add_picked_files(&mut self) {
        let paths = self.with_modal(|host| host.pick_files("Add items"));
        for path in paths {
            let target = if is_shortcut(&path) {
                self.host.resolve_shortcut(&path)
            } else {
                None
            };
            let item = item_from_file(&path, target.as_deref());
            if let Err(e) = self.add_item(item) {
                self.report_error("Add item failed", &e);
            }
        }
    }

    fn edit_properties(&mut self, id: ItemId) {
        let Some(current) = self.session.as_ref().and_then(|s| s.item(id)).cloned() else {
            return;
        };
        let Some(edited) = self.with_modal(|host| host.edit_item(&current)) else {
            debug!("Properties for '{}' cancelled", current.display_name);
            return;
        };
        if let Err(e) = self.update_item(id, edited) {
            self.report_error("Properties", &e);
        }
    }

    /// Replace the details of item `id` with `edited`. The item keeps its
    /// id, position and selection state.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when the edit is rejected, or
    /// `Error::Surface` when no popup is open or the item is gone.
    pub fn update_item(&mut self, id: ItemId, mut edited: LauncherItem) -> Result<()> {
        validate_item(&edited)?;
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| Error::Surface("popup is not open".to_string()))?;
        let slot = session
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| Error::Surface(format!("item {id} is gone")))?;

        edited.id = slot.id;
        edited.set_position(slot.position());
        edited.is_selected = slot.is_selected;
        info!("Updated '{}'", edited.display_name);
        *slot = edited;
        session.hovered = None;
        self.services.store.save_items(&session.items);
        session.surface.invalidate();
        Ok(())
    }

    #[must_use]
    pub fn layout_names(&self) -> Vec<String> {
        self.services.layouts.names()
    }

    fn prompt_save_layout(&mut self) {
        let Some(name) = self.with_modal(|host| host.prompt_text("Save layout as", "")) else {
            return;
        };
        if let Err(e) = self.save_layout_as(&name) {
            self.report_error("Save layout failed", &e);
        }
    }

    /// Snapshot the open popup as a named layout. An existing layout with
    /// the same name (ignoring case) is replaced only if the host confirms.
    ///
    /// Returns false when the overwrite was declined.
    ///
    /// # Errors
    ///
    /// `Error::Surface` when no popup is open, `InvalidLayoutName`, or the
    /// layout store's write error.
    pub fn save_layout_as(&mut self, name: &str) -> Result<bool> {
        let layout = {
            let session = self
                .session
                .as_ref()
                .ok_or_else(|| Error::Surface("popup is not open".to_string()))?;
            NamedLayout::capture(
                name.trim(),
                &session.items,
                session.surface.frame().size(),
                self.config.appearance.icon_size,
                self.config.appearance.icon_spacing,
            )?
        };

        match self.services.layouts.save(layout.clone(), false) {
            Ok(()) => Ok(true),
            Err(Error::LayoutExists(existing)) => {
                let message = format!("A layout named '{existing}' already exists. Replace it?");
                if self.with_modal(|host| host.confirm("Save layout", &message)) {
                    self.services.layouts.save(layout, true)?;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the working items with a saved layout.
    ///
    /// Positions saved under different icon settings are re-projected onto
    /// the current grid, the window takes the saved size, and the history
    /// and selection are cleared.
    ///
    /// # Errors
    ///
    /// `LayoutNotFound`, a decode error of the saved items, or
    /// `Error::Surface` when no popup is open.
    pub fn load_layout(&mut self, name: &str) -> Result<()> {
        let layout = self
            .services
            .layouts
            .find(name)
            .ok_or_else(|| Error::LayoutNotFound(name.to_string()))?;
        let mut items = layout.items()?;
        for item in &mut items {
            item.sanitize_position();
            item.is_selected = false;
        }

        {
            let session = self
                .session
                .as_mut()
                .ok_or_else(|| Error::Surface("popup is not open".to_string()))?;
            session.drag.cancel(&mut session.items);
            let size = layout.window_size();
            if size.width > 0.0 && size.height > 0.0 {
                session.surface.set_size(size);
            }
        }

        let current = self.config.grid_metrics();
        let saved = GridMetrics::new(layout.icon_size, layout.icon_spacing, current.padding);
        let bounds = self.bounds();
        let rescaled = rescale_positions(&mut items, &saved, &current, bounds.as_ref());
        if !rescaled && let Some(bounds) = &bounds {
            for item in &mut items {
                item.set_position(bounds.clamp(item.position()));
            }
        }

        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        session.items = items;
        session.selection = SelectionSet::new();
        session.history.clear();
        session.pending_launch = None;
        session.clicks.reset();
        session.hovered = None;
        self.services.store.save_items(&session.items);
        session.surface.invalidate();
        info!(
            "Loaded layout '{}' ({} items{})",
            layout.name,
            session.items.len(),
            if rescaled { ", rescaled" } else { "" }
        );
        Ok(())
    }

    fn report_error(&mut self, title: &str, err: &Error) {
        warn!("{title}: {err}");
        let message = err.to_string();
        self.with_modal(|host| host.report_error(title, &message));
    }
}
