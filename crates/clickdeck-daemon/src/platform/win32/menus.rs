//! Native menus for the popup's item and background context menus.

use clickdeck_core::popup::{BackgroundAction, ContextMenu, ItemAction};
use clickdeck_types::ItemId;
use windows::Win32::Foundation::{HWND, LPARAM, POINT, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, DestroyMenu, GetCursorPos, HMENU, MENU_ITEM_FLAGS, MF_GRAYED,
    MF_POPUP, MF_SEPARATOR, MF_STRING, PostMessageW, TPM_LEFTALIGN, TPM_RETURNCMD,
    TPM_RIGHTBUTTON, TrackPopupMenu, WM_NULL,
};
use windows::core::PCWSTR;

use super::{pcwstr, to_wide};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum MenuChoice {
    Item(ItemId, ItemAction),
    Background(BackgroundAction),
}

const ID_LAUNCH: usize = 1;
const ID_OPEN_LOCATION: usize = 2;
const ID_REMOVE: usize = 3;
const ID_PROPERTIES: usize = 4;

const ID_ALIGN: usize = 10;
const ID_STACK_VERTICAL: usize = 11;
const ID_STACK_HORIZONTAL: usize = 12;
const ID_SNAP_ALL: usize = 13;
const ID_UNDO: usize = 14;
const ID_REDO: usize = 15;
const ID_SELECT_ALL: usize = 16;
const ID_SAVE_LAYOUT: usize = 17;
const ID_CLOSE: usize = 18;
const ID_ADD_ITEMS: usize = 19;
/// Layout `n` of the "Load layout" submenu is `ID_LAYOUT_BASE + n`
const ID_LAYOUT_BASE: usize = 100;

/// Show `menu` at the cursor and block until it is dismissed.
pub(super) fn track(hwnd: HWND, menu: &ContextMenu) -> Option<MenuChoice> {
    let chosen = unsafe {
        let handle = CreatePopupMenu().ok()?;
        build(handle, menu);

        let mut pt = POINT::default();
        let _ = GetCursorPos(&mut pt);
        let chosen = TrackPopupMenu(
            handle,
            TPM_LEFTALIGN | TPM_RIGHTBUTTON | TPM_RETURNCMD,
            pt.x,
            pt.y,
            0,
            hwnd,
            None,
        );
        // Destroys submenus too
        let _ = DestroyMenu(handle);
        let _ = PostMessageW(hwnd, WM_NULL, WPARAM(0), LPARAM(0));
        chosen
    };
    decode(menu, usize::try_from(chosen.0).ok()?)
}

fn build(handle: HMENU, menu: &ContextMenu) {
    let add = |flags: MENU_ITEM_FLAGS, id: usize, label: &str| {
        let wide = to_wide(label);
        let _ = unsafe { AppendMenuW(handle, flags, id, pcwstr(&wide)) };
    };
    let separator = || {
        let _ = unsafe { AppendMenuW(handle, MF_SEPARATOR, 0, PCWSTR::null()) };
    };
    let enabled = |on: bool| if on { MF_STRING } else { MF_STRING | MF_GRAYED };

    match menu {
        ContextMenu::Item { .. } => {
            add(MF_STRING, ID_LAUNCH, "Launch");
            add(MF_STRING, ID_OPEN_LOCATION, "Open file location");
            separator();
            add(MF_STRING, ID_REMOVE, "Remove");
            add(MF_STRING, ID_PROPERTIES, "Properties");
        }
        ContextMenu::Background {
            can_undo,
            can_redo,
            layouts,
        } => {
            add(MF_STRING, ID_ADD_ITEMS, "Add items...");
            separator();
            add(MF_STRING, ID_ALIGN, "Align to grid");
            add(MF_STRING, ID_STACK_VERTICAL, "Stack vertically");
            add(MF_STRING, ID_STACK_HORIZONTAL, "Stack horizontally");
            add(MF_STRING, ID_SNAP_ALL, "Snap all to grid");
            separator();
            add(enabled(*can_undo), ID_UNDO, "Undo\tCtrl+Z");
            add(enabled(*can_redo), ID_REDO, "Redo\tCtrl+Y");
            add(MF_STRING, ID_SELECT_ALL, "Select all\tCtrl+A");
            separator();
            add(MF_STRING, ID_SAVE_LAYOUT, "Save layout as...");
            match unsafe { CreatePopupMenu() } {
                Ok(sub) if !layouts.is_empty() => {
                    for (n, name) in layouts.iter().enumerate() {
                        let wide = to_wide(name);
                        let _ = unsafe {
                            AppendMenuW(sub, MF_STRING, ID_LAYOUT_BASE + n, pcwstr(&wide))
                        };
                    }
                    add(MF_POPUP, sub.0 as usize, "Load layout");
                }
                Ok(sub) => {
                    let _ = unsafe { DestroyMenu(sub) };
                    add(MF_STRING | MF_GRAYED, 0, "Load layout");
                }
                Err(_) => add(MF_STRING | MF_GRAYED, 0, "Load layout"),
            }
            separator();
            add(MF_STRING, ID_CLOSE, "Close");
        }
    }
}

fn decode(menu: &ContextMenu, id: usize) -> Option<MenuChoice> {
    match menu {
        ContextMenu::Item { id: item } => {
            let action = match id {
                ID_LAUNCH => ItemAction::Launch,
                ID_OPEN_LOCATION => ItemAction::OpenLocation,
                ID_REMOVE => ItemAction::Remove,
                ID_PROPERTIES => ItemAction::Properties,
                _ => return None,
            };
            Some(MenuChoice::Item(*item, action))
        }
        ContextMenu::Background { layouts, .. } => {
            let action = match id {
                ID_ADD_ITEMS => BackgroundAction::AddItems,
                ID_ALIGN => BackgroundAction::AlignToGrid,
                ID_STACK_VERTICAL => BackgroundAction::StackVertical,
                ID_STACK_HORIZONTAL => BackgroundAction::StackHorizontal,
                ID_SNAP_ALL => BackgroundAction::SnapAllToGrid,
                ID_UNDO => BackgroundAction::Undo,
                ID_REDO => BackgroundAction::Redo,
                ID_SELECT_ALL => BackgroundAction::SelectAll,
                ID_SAVE_LAYOUT => BackgroundAction::SaveLayoutAs,
                ID_CLOSE => BackgroundAction::Close,
                n if n >= ID_LAYOUT_BASE => {
                    BackgroundAction::LoadLayout(layouts.get(n - ID_LAYOUT_BASE)?.clone())
                }
                _ => return None,
            };
            Some(MenuChoice::Background(action))
        }
    }
}
