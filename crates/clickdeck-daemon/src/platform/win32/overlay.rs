//! The popup window: a topmost, resizable tool window that forwards input
//! to the controller and paints its view.

use clickdeck_core::popup::{CloseReason, Key, PopupSurface};
use clickdeck_core::{Error, Result, now_millis};
use clickdeck_types::{Point, Rect, Size};
use tracing::debug;
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    ReleaseCapture, SetCapture, VK_DELETE, VK_ESCAPE,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CS_HREDRAW, CS_VREDRAW, CreateWindowExW, DefWindowProcW, DestroyWindow, GetClientRect,
    GetWindowRect, IDC_ARROW, InvalidateRect, KillTimer, LoadCursorW, RegisterClassExW,
    SW_SHOW, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOZORDER, SetForegroundWindow, SetTimer,
    SetWindowPos, SetWindowTextW, ShowWindow, WA_INACTIVE, WM_ACTIVATE, WM_CAPTURECHANGED,
    WM_CLOSE, WM_ERASEBKGND, WM_KEYDOWN, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MOUSEMOVE, WM_PAINT,
    WM_RBUTTONUP, WM_TIMER, WNDCLASSEXW, WS_CAPTION, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_POPUP,
    WS_SYSMENU, WS_THICKFRAME,
};
use windows::core::{PCWSTR, w};

use super::app::with_app;
use super::hook::modifier_state;
use super::menus::{self, MenuChoice};
use super::paint::paint_popup;
use super::{pcwstr, to_wide};

const POPUP_CLASS: PCWSTR = w!("ClickdeckPopup");
const TICK_TIMER: usize = 1;

pub(super) fn register_class(instance: HINSTANCE) -> windows::core::Result<()> {
    #[allow(clippy::cast_possible_truncation)] // struct size
    let size = size_of::<WNDCLASSEXW>() as u32;
    let class = WNDCLASSEXW {
        cbSize: size,
        // No CS_DBLCLKS: double clicks are recognised from two button-downs
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(popup_proc),
        hInstance: instance,
        hCursor: unsafe { LoadCursorW(None, IDC_ARROW)? },
        lpszClassName: POPUP_CLASS,
        ..Default::default()
    };
    if unsafe { RegisterClassExW(&class) } == 0 {
        return Err(windows::core::Error::from_win32());
    }
    Ok(())
}

pub(super) fn create(instance: HINSTANCE, frame: Rect) -> Result<Box<dyn PopupSurface>> {
    let (x, y, width, height) = screen_rect(frame);
    let hwnd = unsafe {
        CreateWindowExW(
            WS_EX_TOOLWINDOW | WS_EX_TOPMOST,
            POPUP_CLASS,
            w!("clickdeck"),
            WS_POPUP | WS_CAPTION | WS_SYSMENU | WS_THICKFRAME,
            x,
            y,
            width,
            height,
            None,
            None,
            instance,
            None,
        )
    }
    .map_err(|e| Error::Surface(e.message().to_string()))?;

    debug!("Popup window created at ({x}, {y}) {width}x{height}");
    Ok(Box::new(OverlaySurface {
        hwnd,
        destroyed: false,
    }))
}

struct OverlaySurface {
    hwnd: HWND,
    destroyed: bool,
}

impl PopupSurface for OverlaySurface {
    fn show(&mut self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_SHOW);
            let _ = SetForegroundWindow(self.hwnd);
        }
    }

    fn close(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        let _ = unsafe { DestroyWindow(self.hwnd) };
    }

    fn invalidate(&mut self) {
        if !self.destroyed {
            let _ = unsafe { InvalidateRect(self.hwnd, None, false) };
        }
    }

    fn canvas_size(&self) -> Option<Size> {
        if self.destroyed {
            return None;
        }
        let mut rect = RECT::default();
        unsafe { GetClientRect(self.hwnd, &mut rect) }.ok()?;
        let (width, height) = (rect.right - rect.left, rect.bottom - rect.top);
        (width > 0 && height > 0).then(|| Size::new(f64::from(width), f64::from(height)))
    }

    fn set_capture(&mut self, captured: bool) {
        unsafe {
            if captured {
                SetCapture(self.hwnd);
            } else {
                let _ = ReleaseCapture();
            }
        }
    }

    fn set_size(&mut self, size: Size) {
        let (_, _, width, height) = screen_rect(Rect::new(0.0, 0.0, size.width, size.height));
        let _ = unsafe {
            SetWindowPos(
                self.hwnd,
                None,
                0,
                0,
                width,
                height,
                SWP_NOMOVE | SWP_NOZORDER | SWP_NOACTIVATE,
            )
        };
    }

    fn frame(&self) -> Rect {
        let mut rect = RECT::default();
        let _ = unsafe { GetWindowRect(self.hwnd, &mut rect) };
        Rect::new(
            f64::from(rect.left),
            f64::from(rect.top),
            f64::from(rect.right - rect.left),
            f64::from(rect.bottom - rect.top),
        )
    }

    fn schedule_tick(&mut self, delay_ms: u64) {
        let delay = u32::try_from(delay_ms).unwrap_or(u32::MAX);
        unsafe {
            SetTimer(self.hwnd, TICK_TIMER, delay, None);
        }
    }

    fn set_title(&mut self, title: &str) {
        let wide = to_wide(title);
        let _ = unsafe { SetWindowTextW(self.hwnd, pcwstr(&wide)) };
    }
}

impl Drop for OverlaySurface {
    fn drop(&mut self) {
        self.close();
    }
}

#[allow(clippy::cast_possible_truncation)] // screen coordinates fit in i32
fn screen_rect(frame: Rect) -> (i32, i32, i32, i32) {
    (
        frame.x.round() as i32,
        frame.y.round() as i32,
        frame.width.round() as i32,
        frame.height.round() as i32,
    )
}

/// Client coordinates packed into a mouse message's `LPARAM`.
#[allow(clippy::cast_possible_truncation)] // GET_X_LPARAM / GET_Y_LPARAM
fn client_point(lparam: LPARAM) -> Point {
    let x = lparam.0 as i16;
    let y = (lparam.0 >> 16) as i16;
    Point::new(f64::from(x), f64::from(y))
}

fn key_from_vk(vk: usize) -> Key {
    match vk {
        v if v == usize::from(VK_ESCAPE.0) => Key::Escape,
        v if v == usize::from(VK_DELETE.0) => Key::Delete,
        0x41 => Key::A,
        0x59 => Key::Y,
        0x5A => Key::Z,
        _ => Key::Other,
    }
}

/// Right-click inside the popup: ask the controller what to show, run the
/// native menu outside the state borrow, then apply the choice.
fn context_menu(hwnd: HWND, pos: Point) {
    let menu = with_app(|app| {
        let menu = app.controller.context_menu_request(pos);
        if menu.is_some() {
            app.controller.set_context_menu_open(true);
        }
        menu
    })
    .flatten();
    let Some(menu) = menu else {
        return;
    };

    let choice = menus::track(hwnd, &menu);
    with_app(|app| {
        app.controller.set_context_menu_open(false);
        match choice {
            Some(MenuChoice::Item(id, action)) => app.controller.item_action(id, action),
            Some(MenuChoice::Background(action)) => app.controller.background_action(action),
            None => {}
        }
    });
}

unsafe extern "system" fn popup_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_PAINT => {
            let painted =
                with_app(|app| paint_popup(hwnd, app.controller.view().as_ref(), &app.icons));
            if painted.is_none() {
                return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
            }
            LRESULT(0)
        }
        // Everything is repainted in WM_PAINT
        WM_ERASEBKGND => LRESULT(1),
        WM_LBUTTONDOWN => {
            let pos = client_point(lparam);
            with_app(|app| app.controller.pointer_down(pos, modifier_state(false)));
            LRESULT(0)
        }
        WM_MOUSEMOVE => {
            let pos = client_point(lparam);
            with_app(|app| app.controller.pointer_move(pos, modifier_state(false)));
            LRESULT(0)
        }
        WM_LBUTTONUP => {
            with_app(|app| app.controller.pointer_up(now_millis()));
            LRESULT(0)
        }
        WM_CAPTURECHANGED => {
            with_app(|app| app.controller.capture_lost());
            LRESULT(0)
        }
        WM_RBUTTONUP => {
            context_menu(hwnd, client_point(lparam));
            LRESULT(0)
        }
        WM_KEYDOWN => {
            let key = key_from_vk(wparam.0);
            let handled = with_app(|app| app.controller.key_down(key, modifier_state(false)));
            if handled == Some(true) {
                LRESULT(0)
            } else {
                unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
            }
        }
        WM_ACTIVATE => {
            #[allow(clippy::cast_possible_truncation)] // LOWORD
            let state = u32::from(wparam.0 as u16);
            if state == WA_INACTIVE {
                with_app(|app| app.controller.deactivated());
            }
            unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
        }
        WM_TIMER if wparam.0 == TICK_TIMER => {
            let _ = unsafe { KillTimer(hwnd, TICK_TIMER) };
            with_app(|app| app.controller.tick(now_millis()));
            LRESULT(0)
        }
        WM_CLOSE => {
            with_app(|app| app.controller.close(CloseReason::Requested));
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}
