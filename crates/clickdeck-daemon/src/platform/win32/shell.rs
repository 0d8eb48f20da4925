//! Shell-backed launching and icon extraction.

use std::cell::Cell;
use std::ffi::c_void;
use std::path::{Path, PathBuf};

use clickdeck_core::icons::{IconBitmap, IconLoader};
use clickdeck_core::launch::{LaunchRequest, ProcessLauncher};
use clickdeck_core::{Error, Result};
use clickdeck_types::IconSizeCategory;
use tracing::debug;
use windows::Win32::Foundation::MAX_PATH;
use windows::Win32::Graphics::Gdi::{
    BI_RGB, BITMAP, BITMAPINFO, BITMAPINFOHEADER, DIB_RGB_COLORS, DeleteObject, GetDC, GetDIBits,
    GetObjectW, ReleaseDC,
};
use windows::Win32::Storage::FileSystem::FILE_FLAGS_AND_ATTRIBUTES;
use windows::Win32::System::Com::{
    CLSCTX_INPROC_SERVER, COINIT_APARTMENTTHREADED, CoCreateInstance, CoInitializeEx,
    IPersistFile, STGM_READ,
};
use windows::Win32::UI::Shell::{
    IShellLinkW, SHFILEINFOW, SHGFI_ICON, SHGFI_LARGEICON, SHGFI_SMALLICON, SHGetFileInfoW,
    ShellExecuteW, ShellLink,
};
use windows::Win32::UI::WindowsAndMessaging::{
    DestroyIcon, GetIconInfo, HICON, ICONINFO, SW_SHOWNORMAL,
};
use windows::core::{Interface, PCWSTR, w};

use super::{pcwstr, to_wide};

/// Starts items through `ShellExecuteW` so documents and URLs work too.
pub(super) struct ShellLauncher;

impl ShellLauncher {
    fn execute(file: &str, parameters: &str, directory: Option<&Path>) -> Result<()> {
        let file_w = to_wide(file);
        let params_w = to_wide(parameters);
        let dir_w = directory.map(|d| to_wide(&d.to_string_lossy()));

        let result = unsafe {
            ShellExecuteW(
                None,
                w!("open"),
                pcwstr(&file_w),
                if parameters.is_empty() {
                    PCWSTR::null()
                } else {
                    pcwstr(&params_w)
                },
                dir_w.as_deref().map_or(PCWSTR::null(), pcwstr),
                SW_SHOWNORMAL,
            )
        };

        // Values above 32 mean success
        let code = result.0 as isize;
        if code <= 32 {
            return Err(Error::Launch(format!("{file}: ShellExecute failed ({code})")));
        }
        Ok(())
    }
}

impl ProcessLauncher for ShellLauncher {
    fn launch(&self, request: &LaunchRequest) -> Result<()> {
        Self::execute(
            &request.executable,
            &request.arguments,
            request.working_directory.as_deref(),
        )
    }

    fn reveal(&self, path: &Path) -> Result<()> {
        if path.is_dir() {
            return Self::execute(&path.to_string_lossy(), "", None);
        }
        Self::execute("explorer.exe", &format!("/select,\"{}\"", path.display()), None)
    }
}

thread_local! {
    static COM_READY: Cell<bool> = const { Cell::new(false) };
}

/// Icons the shell associates with a path: embedded exe icons, shortcut
/// targets, file-type icons.
pub(super) struct ShellIconLoader;

impl IconLoader for ShellIconLoader {
    fn load(&self, path: &str, size: IconSizeCategory) -> Result<IconBitmap> {
        ensure_com();

        let wide = to_wide(path);
        let mut info = SHFILEINFOW::default();
        let flags = SHGFI_ICON
            | match size {
                IconSizeCategory::Small => SHGFI_SMALLICON,
                IconSizeCategory::Large => SHGFI_LARGEICON,
            };
        #[allow(clippy::cast_possible_truncation)] // struct size
        let info_size = size_of::<SHFILEINFOW>() as u32;

        let found = unsafe {
            SHGetFileInfoW(
                pcwstr(&wide),
                FILE_FLAGS_AND_ATTRIBUTES(0),
                Some(&raw mut info),
                info_size,
                flags,
            )
        };
        if found == 0 || info.hIcon.is_invalid() {
            return Err(Error::Icon(format!("{path}: no shell icon")));
        }

        let bitmap = icon_to_bitmap(info.hIcon);
        unsafe {
            let _ = DestroyIcon(info.hIcon);
        }
        bitmap.map_err(|e| Error::Icon(format!("{path}: {e}")))
    }
}

/// Target path stored in a `.lnk` file. The link is read as saved, without
/// searching for a target that has moved.
pub(super) fn resolve_shortcut(path: &Path) -> Option<PathBuf> {
    ensure_com();
    let wide = to_wide(&path.to_string_lossy());
    let mut buffer = [0u16; MAX_PATH as usize];
    let loaded = unsafe {
        CoCreateInstance::<_, IShellLinkW>(&ShellLink, None, CLSCTX_INPROC_SERVER).and_then(|link| {
            link.cast::<IPersistFile>()?.Load(pcwstr(&wide), STGM_READ)?;
            link.GetPath(&mut buffer, std::ptr::null_mut(), 0)
        })
    };
    if let Err(e) = loaded {
        debug!("Cannot read shortcut {}: {}", path.display(), e.message());
        return None;
    }

    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    let target = String::from_utf16_lossy(&buffer[..len]);
    debug!("Shortcut {} points to '{target}'", path.display());
    (!target.is_empty()).then(|| PathBuf::from(target))
}

/// COM must be initialized on any thread that asks the shell for icons or
/// shortcuts.
fn ensure_com() {
    COM_READY.with(|ready| {
        if !ready.get() {
            // S_FALSE and RPC_E_CHANGED_MODE both leave COM usable
            let _ = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) };
            ready.set(true);
        }
    });
}

fn icon_to_bitmap(icon: HICON) -> std::result::Result<IconBitmap, String> {
    let mut info = ICONINFO::default();
    unsafe { GetIconInfo(icon, &mut info) }.map_err(|e| e.message().to_string())?;

    let result = color_bits(&info);
    unsafe {
        let _ = DeleteObject(info.hbmColor);
        let _ = DeleteObject(info.hbmMask);
    }
    result
}

fn color_bits(info: &ICONINFO) -> std::result::Result<IconBitmap, String> {
    if info.hbmColor.is_invalid() {
        return Err("monochrome icon".to_string());
    }

    let mut bm = BITMAP::default();
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)] // struct size
    let bm_size = size_of::<BITMAP>() as i32;
    let read = unsafe {
        GetObjectW(
            info.hbmColor,
            bm_size,
            Some((&raw mut bm).cast::<c_void>()),
        )
    };
    if read == 0 || bm.bmWidth <= 0 || bm.bmHeight <= 0 {
        return Err("unreadable icon bitmap".to_string());
    }

    let width = bm.bmWidth.cast_unsigned();
    let height = bm.bmHeight.cast_unsigned();
    #[allow(clippy::cast_possible_truncation)] // struct size
    let header_size = size_of::<BITMAPINFOHEADER>() as u32;
    let mut header = BITMAPINFO {
        bmiHeader: BITMAPINFOHEADER {
            biSize: header_size,
            biWidth: bm.bmWidth,
            // Negative height: top-down rows
            biHeight: -bm.bmHeight,
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        },
        ..Default::default()
    };

    let mut pixels = vec![0u8; width as usize * height as usize * 4];
    let lines = unsafe {
        let dc = GetDC(None);
        let lines = GetDIBits(
            dc,
            info.hbmColor,
            0,
            height,
            Some(pixels.as_mut_ptr().cast()),
            &mut header,
            DIB_RGB_COLORS,
        );
        ReleaseDC(None, dc);
        lines
    };
    if lines == 0 {
        return Err("GetDIBits failed".to_string());
    }

    debug!("Extracted {width}x{height} shell icon");
    Ok(IconBitmap {
        width,
        height,
        rgba: bgra_to_rgba(pixels),
    })
}

/// Swap channels in place; icons without any alpha are treated as opaque.
fn bgra_to_rgba(mut pixels: Vec<u8>) -> Vec<u8> {
    let has_alpha = pixels.chunks_exact(4).any(|px| px[3] != 0);
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
        if !has_alpha {
            px[3] = 0xff;
        }
    }
    pixels
}
