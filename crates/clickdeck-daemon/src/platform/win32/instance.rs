use tracing::debug;
use windows::Win32::Foundation::{CloseHandle, ERROR_ALREADY_EXISTS, FALSE, GetLastError, HANDLE};
use windows::Win32::System::Threading::CreateMutexW;

use super::{pcwstr, to_wide};

/// Named mutex held for the life of the tray process.
pub(super) struct SingleInstance(HANDLE);

impl SingleInstance {
    /// `Ok(None)` when another process already holds `name`.
    pub(super) fn acquire(name: &str) -> std::io::Result<Option<Self>> {
        let wide = to_wide(name);
        let handle =
            unsafe { CreateMutexW(None, FALSE, pcwstr(&wide)) }.map_err(std::io::Error::other)?;

        if unsafe { GetLastError() } == ERROR_ALREADY_EXISTS {
            debug!("Mutex {name} already held");
            unsafe {
                let _ = CloseHandle(handle);
            }
            return Ok(None);
        }

        Ok(Some(Self(handle)))
    }
}

impl Drop for SingleInstance {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}
