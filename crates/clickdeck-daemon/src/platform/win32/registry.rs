//! Start at login through `HKCU\...\CurrentVersion\Run`.

use clickdeck_core::autostart::Autostart;
use clickdeck_core::{Error, Result};
use tracing::debug;
use windows::Win32::Foundation::{ERROR_FILE_NOT_FOUND, WIN32_ERROR};
use windows::Win32::System::Registry::{
    HKEY, HKEY_CURRENT_USER, KEY_QUERY_VALUE, KEY_SET_VALUE, REG_OPTION_NON_VOLATILE, REG_SAM_FLAGS,
    REG_SZ, RegCloseKey, RegCreateKeyExW, RegDeleteValueW, RegOpenKeyExW, RegQueryValueExW,
    RegSetValueExW,
};
use windows::core::{PCWSTR, w};

use super::{pcwstr, to_wide};

const RUN_KEY: PCWSTR = w!("Software\\Microsoft\\Windows\\CurrentVersion\\Run");
const VALUE_NAME: &str = "clickdeck";

pub(crate) struct RegistryAutostart {
    /// Quoted executable path written as the value data
    command: String,
}

impl RegistryAutostart {
    pub(crate) fn for_current_exe() -> std::io::Result<Self> {
        let exe = std::env::current_exe()?;
        Ok(Self {
            command: format!("\"{}\"", exe.display()),
        })
    }

    fn read_value(&self) -> Result<Option<String>> {
        let Some(key) = RunKey::open(KEY_QUERY_VALUE)? else {
            return Ok(None);
        };
        let name = to_wide(VALUE_NAME);
        let mut buffer = vec![0u16; 1024];
        #[allow(clippy::cast_possible_truncation)] // fixed 2 KiB buffer
        let mut len = (buffer.len() * 2) as u32;

        let status = unsafe {
            RegQueryValueExW(
                key.0,
                pcwstr(&name),
                None,
                None,
                Some(buffer.as_mut_ptr().cast()),
                Some(&raw mut len),
            )
        };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        check(status, "read")?;

        buffer.truncate(len as usize / 2);
        let value = String::from_utf16_lossy(&buffer);
        Ok(Some(value.trim_end_matches('\0').to_string()))
    }
}

impl Autostart for RegistryAutostart {
    fn is_registered(&self) -> Result<bool> {
        Ok(self
            .read_value()?
            .is_some_and(|value| same_command(&value, &self.command)))
    }

    fn register(&self) -> Result<()> {
        let key = RunKey::create()?;
        let name = to_wide(VALUE_NAME);
        let data: Vec<u8> = to_wide(&self.command)
            .iter()
            .flat_map(|unit| unit.to_le_bytes())
            .collect();
        let status = unsafe { RegSetValueExW(key.0, pcwstr(&name), 0, REG_SZ, Some(&data)) };
        check(status, "write")?;
        debug!("Run value set to {}", self.command);
        Ok(())
    }

    fn unregister(&self) -> Result<()> {
        let Some(key) = RunKey::open(KEY_SET_VALUE)? else {
            return Ok(());
        };
        let name = to_wide(VALUE_NAME);
        let status = unsafe { RegDeleteValueW(key.0, pcwstr(&name)) };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(());
        }
        check(status, "delete")
    }
}

/// Open handle to the Run key, closed on drop.
struct RunKey(HKEY);

impl RunKey {
    fn open(access: REG_SAM_FLAGS) -> Result<Option<Self>> {
        let mut key = HKEY::default();
        let status = unsafe { RegOpenKeyExW(HKEY_CURRENT_USER, RUN_KEY, 0, access, &mut key) };
        if status == ERROR_FILE_NOT_FOUND {
            return Ok(None);
        }
        check(status, "open")?;
        Ok(Some(Self(key)))
    }

    fn create() -> Result<Self> {
        let mut key = HKEY::default();
        let status = unsafe {
            RegCreateKeyExW(
                HKEY_CURRENT_USER,
                RUN_KEY,
                0,
                PCWSTR::null(),
                REG_OPTION_NON_VOLATILE,
                KEY_SET_VALUE,
                None,
                &mut key,
                None,
            )
        };
        check(status, "create")?;
        Ok(Self(key))
    }
}

impl Drop for RunKey {
    fn drop(&mut self) {
        let _ = unsafe { RegCloseKey(self.0) };
    }
}

fn check(status: WIN32_ERROR, what: &str) -> Result<()> {
    status
        .ok()
        .map_err(|e| Error::Autostart(format!("Run key {what} failed: {}", e.message())))
}

/// Compare Run values ignoring case and surrounding quotes.
fn same_command(stored: &str, wanted: &str) -> bool {
    let unquote = |s: &str| s.trim().trim_matches('"').to_lowercase();
    unquote(stored) == unquote(wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_command_ignores_quotes_and_case() {
        assert!(same_command(
            "C:\\Tools\\clickdeck.exe",
            "\"c:\\tools\\ClickDeck.exe\""
        ));
        assert!(!same_command(
            "\"C:\\Old\\clickdeck.exe\"",
            "\"C:\\Tools\\clickdeck.exe\""
        ));
    }
}
