//! Win32 implementation: hook thread, hidden host window with tray icon,
//! popup overlay windows and the shell services behind them.

mod app;
mod dialogs;
mod hook;
mod instance;
mod menus;
mod overlay;
mod paint;
mod registry;
mod shell;
mod tray;

use clickdeck_core::autostart::Autostart;
use windows::Win32::System::Console::{ATTACH_PARENT_PROCESS, AttachConsole};
use windows::core::PCWSTR;

pub use app::run;

/// # Errors
///
/// Returns an error when the current executable path cannot be resolved.
pub fn system_autostart() -> crate::Result<Box<dyn Autostart>> {
    Ok(Box::new(registry::RegistryAutostart::for_current_exe()?))
}

/// Reuse the launching terminal for CLI output in GUI-subsystem builds.
pub fn attach_parent_console() {
    // Fails harmlessly when started from Explorer or already attached
    let _ = unsafe { AttachConsole(ATTACH_PARENT_PROCESS) };
}

/// Null-terminated UTF-16 copy of `s`.
pub(crate) fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Borrow a buffer from [`to_wide`] as a `PCWSTR`.
pub(crate) fn pcwstr(wide: &[u16]) -> PCWSTR {
    PCWSTR(wide.as_ptr())
}

/// Low 16 bits of an `HRESULT`, the Win32 error code it wraps.
pub(crate) fn win32_code(error: &windows::core::Error) -> u32 {
    error.code().0.cast_unsigned() & 0xFFFF
}
