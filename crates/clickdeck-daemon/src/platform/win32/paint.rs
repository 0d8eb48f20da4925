//! GDI painting of the popup canvas.

use std::ffi::c_void;

use clickdeck_core::icons::{IconBitmap, IconCache};
use clickdeck_core::popup::{PopupView, TileView};
use windows::Win32::Foundation::{COLORREF, HWND, RECT};
use windows::Win32::Graphics::Gdi::{
    AC_SRC_ALPHA, AC_SRC_OVER, AlphaBlend, BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BLENDFUNCTION,
    BeginPaint, BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, CreateDIBSection,
    CreateSolidBrush, DIB_RGB_COLORS, DT_CENTER, DT_SINGLELINE, DT_VCENTER, DeleteDC,
    DeleteObject, DrawTextW, EndPaint, FillRect, FrameRect, HDC, PAINTSTRUCT, SRCCOPY,
    SelectObject, SetBkMode, SetTextColor, TRANSPARENT,
};
use windows::Win32::UI::WindowsAndMessaging::GetClientRect;

/// Shown instead of tiles when nothing is launchable.
const PLACEHOLDER_TEXT: &str = "No items yet";

const BACKGROUND: COLORREF = rgb(0x20, 0x22, 0x27);
const SELECTED_FILL: COLORREF = rgb(0x2f, 0x4f, 0x7f);
const SELECTED_BORDER: COLORREF = rgb(0x5c, 0x9d, 0xff);
const HOVER_FILL: COLORREF = rgb(0x34, 0x37, 0x3f);
const TEXT: COLORREF = rgb(0x9a, 0xa0, 0xab);

/// Space between a tile's edge and its icon.
const TILE_CHROME: f64 = 5.0;

#[allow(clippy::cast_lossless)] // u32::from is not usable in const fn
const fn rgb(r: u8, g: u8, b: u8) -> COLORREF {
    COLORREF(r as u32 | (g as u32) << 8 | (b as u32) << 16)
}

/// Handle `WM_PAINT` for a popup window.
///
/// With no view (state busy or already closed) only the background is drawn.
pub(super) fn paint_popup(hwnd: HWND, view: Option<&PopupView>, icons: &IconCache) {
    unsafe {
        let mut ps = PAINTSTRUCT::default();
        let hdc = BeginPaint(hwnd, &mut ps);
        let mut client = RECT::default();
        let _ = GetClientRect(hwnd, &mut client);
        let (width, height) = (client.right - client.left, client.bottom - client.top);

        // Paint off-screen to avoid flicker while dragging
        let mem_dc = CreateCompatibleDC(hdc);
        let mem_bmp = CreateCompatibleBitmap(hdc, width, height);
        let old_bmp = SelectObject(mem_dc, mem_bmp);

        fill(mem_dc, &client, BACKGROUND);
        match view {
            Some(view) if view.placeholder => draw_placeholder(mem_dc, client),
            Some(view) => {
                for tile in &view.tiles {
                    draw_tile(mem_dc, tile, view, icons);
                }
            }
            None => {}
        }

        let _ = BitBlt(hdc, 0, 0, width, height, mem_dc, 0, 0, SRCCOPY);
        SelectObject(mem_dc, old_bmp);
        let _ = DeleteObject(mem_bmp);
        let _ = DeleteDC(mem_dc);
        let _ = EndPaint(hwnd, &ps);
    }
}

fn draw_tile(dc: HDC, tile: &TileView, view: &PopupView, icons: &IconCache) {
    let bounds = to_rect(
        tile.bounds.x,
        tile.bounds.y,
        tile.bounds.width,
        tile.bounds.height,
    );
    if tile.selected {
        fill(dc, &bounds, SELECTED_FILL);
        frame(dc, &bounds, SELECTED_BORDER);
    } else if tile.hovered {
        fill(dc, &bounds, HOVER_FILL);
    }

    let icon = icons.get_or_add(&tile.item, view.icon_category);
    let dest = to_rect(
        tile.bounds.x + TILE_CHROME,
        tile.bounds.y + TILE_CHROME,
        view.icon_size,
        view.icon_size,
    );
    draw_bitmap(dc, &icon, dest);
}

fn draw_placeholder(dc: HDC, mut client: RECT) {
    let mut text: Vec<u16> = PLACEHOLDER_TEXT.encode_utf16().collect();
    unsafe {
        SetBkMode(dc, TRANSPARENT);
        SetTextColor(dc, TEXT);
        DrawTextW(
            dc,
            &mut text,
            &mut client,
            DT_CENTER | DT_VCENTER | DT_SINGLELINE,
        );
    }
}

/// Alpha-blend an RGBA bitmap scaled into `dest`.
fn draw_bitmap(dc: HDC, bitmap: &IconBitmap, dest: RECT) {
    let (Ok(width), Ok(height)) = (i32::try_from(bitmap.width), i32::try_from(bitmap.height))
    else {
        return;
    };
    if width == 0 || height == 0 {
        return;
    }

    #[allow(clippy::cast_possible_truncation)] // struct size
    let header_size = size_of::<BITMAPINFOHEADER>() as u32;
    let info = BITMAPINFO {
        bmiHeader: BITMAPINFOHEADER {
            biSize: header_size,
            biWidth: width,
            biHeight: -height,
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        },
        ..Default::default()
    };

    unsafe {
        let mut bits: *mut c_void = std::ptr::null_mut();
        let Ok(dib) = CreateDIBSection(dc, &info, DIB_RGB_COLORS, &mut bits, None, 0) else {
            return;
        };
        let pixels = premultiplied_bgra(bitmap);
        std::ptr::copy_nonoverlapping(pixels.as_ptr(), bits.cast::<u8>(), pixels.len());

        let src = CreateCompatibleDC(dc);
        let old = SelectObject(src, dib);
        #[allow(clippy::cast_possible_truncation)] // blend constants are single bytes
        let blend = BLENDFUNCTION {
            BlendOp: AC_SRC_OVER as u8,
            BlendFlags: 0,
            SourceConstantAlpha: 0xff,
            AlphaFormat: AC_SRC_ALPHA as u8,
        };
        let _ = AlphaBlend(
            dc,
            dest.left,
            dest.top,
            dest.right - dest.left,
            dest.bottom - dest.top,
            src,
            0,
            0,
            width,
            height,
            blend,
        );
        SelectObject(src, old);
        let _ = DeleteDC(src);
        let _ = DeleteObject(dib);
    }
}

/// GDI's `AlphaBlend` wants BGRA with colour already scaled by alpha.
fn premultiplied_bgra(bitmap: &IconBitmap) -> Vec<u8> {
    bitmap
        .rgba
        .chunks_exact(4)
        .flat_map(|px| {
            let a = u16::from(px[3]);
            #[allow(clippy::cast_possible_truncation)] // x * a / 255 <= 255
            let scale = |c: u8| (u16::from(c) * a / 255) as u8;
            [scale(px[2]), scale(px[1]), scale(px[0]), px[3]]
        })
        .collect()
}

fn fill(dc: HDC, rect: &RECT, color: COLORREF) {
    unsafe {
        let brush = CreateSolidBrush(color);
        FillRect(dc, rect, brush);
        let _ = DeleteObject(brush);
    }
}

fn frame(dc: HDC, rect: &RECT, color: COLORREF) {
    unsafe {
        let brush = CreateSolidBrush(color);
        FrameRect(dc, rect, brush);
        let _ = DeleteObject(brush);
    }
}

#[allow(clippy::cast_possible_truncation)] // canvas coordinates are small
fn to_rect(x: f64, y: f64, width: f64, height: f64) -> RECT {
    RECT {
        left: x.round() as i32,
        top: y.round() as i32,
        right: (x + width).round() as i32,
        bottom: (y + height).round() as i32,
    }
}
