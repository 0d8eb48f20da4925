//! Notification-area icon and its menu.

use tracing::{info, warn};
use windows::Win32::Foundation::{HWND, LPARAM, POINT, WPARAM};
use windows::Win32::UI::Shell::{
    NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NOTIFYICONDATAW, Shell_NotifyIconW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, DestroyMenu, GetCursorPos, IDI_APPLICATION, LoadIconW,
    MF_CHECKED, MF_SEPARATOR, MF_STRING, MF_UNCHECKED, PostMessageW, SetForegroundWindow,
    TPM_BOTTOMALIGN, TPM_NONOTIFY, TPM_RETURNCMD, TPM_RIGHTBUTTON, TrackPopupMenu, WM_NULL,
};
use windows::core::{PCWSTR, w};

use super::app::WM_TRAY;

const TRAY_ID: u32 = 1;
const TOOLTIP: &str = "clickdeck";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TrayCommand {
    ToggleAutostart,
    Exit,
}

const ID_AUTOSTART: usize = 1;
const ID_EXIT: usize = 2;

/// Registered tray icon, removed on drop.
pub(super) struct TrayIcon {
    hwnd: HWND,
}

impl TrayIcon {
    pub(super) fn add(hwnd: HWND) -> windows::core::Result<Self> {
        let mut data = notify_data(hwnd);
        data.uFlags = NIF_MESSAGE | NIF_ICON | NIF_TIP;
        data.uCallbackMessage = WM_TRAY;
        data.hIcon = unsafe { LoadIconW(None, IDI_APPLICATION)? };

        let tip: Vec<u16> = TOOLTIP.encode_utf16().collect();
        let len = tip.len().min(data.szTip.len() - 1);
        data.szTip[..len].copy_from_slice(&tip[..len]);

        unsafe { Shell_NotifyIconW(NIM_ADD, &data) }.ok()?;
        info!("Tray icon added");
        Ok(Self { hwnd })
    }
}

impl Drop for TrayIcon {
    fn drop(&mut self) {
        let data = notify_data(self.hwnd);
        if !unsafe { Shell_NotifyIconW(NIM_DELETE, &data) }.as_bool() {
            warn!("Failed to remove tray icon");
        }
    }
}

fn notify_data(hwnd: HWND) -> NOTIFYICONDATAW {
    #[allow(clippy::cast_possible_truncation)] // struct size
    let size = size_of::<NOTIFYICONDATAW>() as u32;
    NOTIFYICONDATAW {
        cbSize: size,
        hWnd: hwnd,
        uID: TRAY_ID,
        ..Default::default()
    }
}

/// Show the tray menu at the cursor and wait for a choice.
pub(super) fn show_menu(hwnd: HWND, autostart_enabled: bool) -> Option<TrayCommand> {
    unsafe {
        let menu = CreatePopupMenu().ok()?;
        let check = if autostart_enabled {
            MF_CHECKED
        } else {
            MF_UNCHECKED
        };
        let _ = AppendMenuW(menu, MF_STRING | check, ID_AUTOSTART, w!("Start with Windows"));
        let _ = AppendMenuW(menu, MF_SEPARATOR, 0, PCWSTR::null());
        let _ = AppendMenuW(menu, MF_STRING, ID_EXIT, w!("Exit"));

        // The menu only dismisses on outside clicks when we are foreground
        let _ = SetForegroundWindow(hwnd);
        let mut pt = POINT::default();
        let _ = GetCursorPos(&mut pt);
        let chosen = TrackPopupMenu(
            menu,
            TPM_BOTTOMALIGN | TPM_RIGHTBUTTON | TPM_RETURNCMD | TPM_NONOTIFY,
            pt.x,
            pt.y,
            0,
            hwnd,
            None,
        );
        let _ = DestroyMenu(menu);
        let _ = PostMessageW(hwnd, WM_NULL, WPARAM(0), LPARAM(0));

        match usize::try_from(chosen.0).ok()? {
            ID_AUTOSTART => Some(TrayCommand::ToggleAutostart),
            ID_EXIT => Some(TrayCommand::Exit),
            _ => None,
        }
    }
}
