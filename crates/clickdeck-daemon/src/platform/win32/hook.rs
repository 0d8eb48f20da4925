//! `WH_MOUSE_LL` hook on a dedicated thread.
//!
//! The hook procedure only samples modifiers and hands the click position
//! to the [`ClickDispatcher`]; everything else happens on the UI thread.

use std::cell::RefCell;
use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;

use clickdeck_core::input::{ClickDispatcher, ClickSource};
use clickdeck_core::{Error, Result};
use clickdeck_types::{ModifierState, Point};
use tracing::{debug, error, info};
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, GetKeyState, VIRTUAL_KEY, VK_CONTROL, VK_LWIN, VK_MENU, VK_RWIN, VK_SHIFT,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, MSG, MSLLHOOKSTRUCT, PostThreadMessageW,
    SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, WH_MOUSE_LL, WM_QUIT, WM_RBUTTONUP,
};

use super::win32_code;

thread_local! {
    static DISPATCHER: RefCell<Option<Arc<ClickDispatcher>>> = const { RefCell::new(None) };
}

pub(super) struct MouseHook {
    dispatcher: Arc<ClickDispatcher>,
    thread: Option<(u32, JoinHandle<()>)>,
}

impl MouseHook {
    pub(super) fn new(dispatcher: Arc<ClickDispatcher>) -> Self {
        Self {
            dispatcher,
            thread: None,
        }
    }
}

impl ClickSource for MouseHook {
    fn install(&mut self) -> Result<()> {
        if self.thread.is_some() {
            return Ok(());
        }

        let (tx, rx) = mpsc::channel();
        let dispatcher = Arc::clone(&self.dispatcher);
        let handle = std::thread::Builder::new()
            .name("mouse-hook".to_string())
            .spawn(move || hook_thread(dispatcher, &tx))?;

        match rx.recv() {
            Ok(Ok(thread_id)) => {
                info!("Mouse hook installed");
                self.thread = Some((thread_id, handle));
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(Error::Hook {
                    code: 0,
                    message: "hook thread exited during setup".to_string(),
                })
            }
        }
    }

    fn uninstall(&mut self) {
        let Some((thread_id, handle)) = self.thread.take() else {
            return;
        };
        if let Err(e) = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) } {
            error!("Failed to stop mouse hook thread: {e}");
            return;
        }
        if handle.join().is_err() {
            error!("Mouse hook thread panicked");
        }
        info!("Mouse hook uninstalled");
    }

    fn is_installed(&self) -> bool {
        self.thread.is_some()
    }
}

impl Drop for MouseHook {
    fn drop(&mut self) {
        self.uninstall();
    }
}

fn hook_thread(dispatcher: Arc<ClickDispatcher>, ready: &mpsc::Sender<Result<u32>>) {
    DISPATCHER.with(|slot| *slot.borrow_mut() = Some(dispatcher));

    let installed = unsafe {
        GetModuleHandleW(None)
            .and_then(|module| SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_proc), HINSTANCE::from(module), 0))
    };
    let hook = match installed {
        Ok(hook) => hook,
        Err(e) => {
            let code = win32_code(&e);
            error!("SetWindowsHookExW failed (code {code}): {}", e.message());
            let _ = ready.send(Err(Error::Hook {
                code,
                message: e.message().to_string(),
            }));
            return;
        }
    };

    let _ = ready.send(Ok(unsafe { GetCurrentThreadId() }));

    // Low-level hooks are called through this thread's message loop
    let mut msg = MSG::default();
    while unsafe { GetMessageW(&mut msg, None, 0, 0) }.0 > 0 {
        unsafe {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    if let Err(e) = unsafe { UnhookWindowsHookEx(hook) } {
        error!("UnhookWindowsHookEx failed: {e}");
    }
    DISPATCHER.with(|slot| slot.borrow_mut().take());
    debug!("Mouse hook thread exiting");
}

unsafe extern "system" fn mouse_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    #[allow(clippy::cast_possible_truncation)] // window message ids fit in u32
    let message = wparam.0 as u32;

    if code >= 0 && message == WM_RBUTTONUP {
        let data = unsafe { &*(lparam.0 as *const MSLLHOOKSTRUCT) };
        let at = Point::new(f64::from(data.pt.x), f64::from(data.pt.y));
        let modifiers = modifier_state(true);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            DISPATCHER.with(|slot| {
                slot.borrow()
                    .as_ref()
                    .is_some_and(|dispatcher| dispatcher.on_button_up(at, modifiers))
            })
        }));
        if result.is_err() {
            error!("Mouse hook callback panicked");
        }
    }

    unsafe { CallNextHookEx(None, code, wparam, lparam) }
}

/// Modifier keys currently down.
///
/// `realtime` reads the physical state (hook thread); otherwise the state
/// as of the message being processed (UI thread).
pub(super) fn modifier_state(realtime: bool) -> ModifierState {
    let down = |vk: VIRTUAL_KEY| {
        let state = unsafe {
            if realtime {
                GetAsyncKeyState(i32::from(vk.0))
            } else {
                GetKeyState(i32::from(vk.0))
            }
        };
        state < 0
    };

    ModifierState {
        ctrl: down(VK_CONTROL),
        alt: down(VK_MENU),
        shift: down(VK_SHIFT),
        win: down(VK_LWIN) || down(VK_RWIN),
    }
}
