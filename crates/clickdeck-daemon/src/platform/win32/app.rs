//! Process bootstrap and the hidden host window that owns the UI thread.
//!
//! All UI state lives in a thread-local [`App`] reached through
//! [`with_app`]. Native modal loops (menus, dialogs) re-enter the window
//! procedures while the state is borrowed; those nested messages find it
//! busy and are dropped.

use std::cell::RefCell;
use std::ffi::c_void;
use std::sync::{Arc, OnceLock};

use clickdeck_core::autostart::{Autostart, reconcile};
use clickdeck_core::config::{Config, Directories};
use clickdeck_core::icons::{ChainLoader, IconCache, ImageFileLoader};
use clickdeck_core::input::{ClickDispatcher, ClickSink, ClickSource};
use clickdeck_core::popup::{PopupController, PopupServices};
use clickdeck_core::store::{JsonItemStore, LauncherStore};
use clickdeck_types::{IconSizeCategory, Point};
use tracing::{debug, error, info, warn};
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW, KillTimer,
    MSG, PostMessageW, PostQuitMessage, RegisterClassExW, SetTimer, TranslateMessage, WM_APP,
    WM_CONTEXTMENU, WM_DESTROY, WM_ENDSESSION, WM_RBUTTONUP, WM_TIMER, WINDOW_EX_STYLE,
    WNDCLASSEXW, WS_OVERLAPPED,
};
use windows::core::{PCWSTR, w};

use super::dialogs::{self, Win32Host};
use super::hook::MouseHook;
use super::instance::SingleInstance;
use super::registry::RegistryAutostart;
use super::shell::{ShellIconLoader, ShellLauncher};
use super::tray::{self, TrayCommand, TrayIcon};
use super::overlay;
use crate::cli::layout_library;
use crate::config_watcher::{ConfigWatcher, spawn_config_watcher};

/// A qualifying click; screen x in `WPARAM`, y in `LPARAM`.
const WM_TRIGGER: u32 = WM_APP + 1;
const WM_CONFIG_CHANGED: u32 = WM_APP + 2;
pub(super) const WM_TRAY: u32 = WM_APP + 3;

const RELOAD_RETRY_TIMER: usize = 1;
const RELOAD_RETRY_MS: u32 = 250;

const HOST_CLASS: PCWSTR = w!("ClickdeckHost");
const INSTANCE_MUTEX: &str = "Local\\clickdeck";

/// Reachable without borrowing [`App`] so a trigger is always acknowledged.
static CLICKS: OnceLock<Arc<ClickDispatcher>> = OnceLock::new();

thread_local! {
    static APP: RefCell<Option<App>> = const { RefCell::new(None) };
}

pub(super) struct App {
    // Stop intake before anything else is torn down
    hook: MouseHook,
    pub(super) controller: PopupController,
    pub(super) icons: Arc<IconCache>,
    dispatcher: Arc<ClickDispatcher>,
    autostart: RegistryAutostart,
    dirs: Directories,
    _tray: Option<TrayIcon>,
    _watcher: Option<ConfigWatcher>,
}

/// Run `f` against the UI state. `None` when there is no state or it is
/// already borrowed further up the stack.
pub(super) fn with_app<T>(f: impl FnOnce(&mut App) -> T) -> Option<T> {
    APP.with(|slot| {
        let Ok(mut guard) = slot.try_borrow_mut() else {
            debug!("UI state busy, message dropped");
            return None;
        };
        guard.as_mut().map(f)
    })
}

/// Posts clicks from the hook thread to the host window.
struct WindowSink {
    hwnd: isize,
}

impl ClickSink for WindowSink {
    fn click_detected(&self, at: Point) -> bool {
        #[allow(clippy::cast_possible_truncation)] // screen coordinates fit in i32
        let (x, y) = (at.x.round() as i32, at.y.round() as i32);
        post(
            self.hwnd,
            WM_TRIGGER,
            WPARAM(x.cast_unsigned() as usize),
            LPARAM(y as isize),
        )
    }
}

fn post(hwnd: isize, msg: u32, wparam: WPARAM, lparam: LPARAM) -> bool {
    let hwnd = HWND(hwnd as *mut c_void);
    unsafe { PostMessageW(hwnd, msg, wparam, lparam) }.is_ok()
}

/// Run the tray process until it is told to exit.
///
/// # Errors
///
/// Returns an error when the windows, the mouse hook or the data
/// directories cannot be set up.
pub fn run(dirs: Directories) -> crate::Result<()> {
    let Some(_instance) = SingleInstance::acquire(INSTANCE_MUTEX)? else {
        info!("Another instance is already running");
        dialogs::show_info("clickdeck", "clickdeck is already running.");
        return Ok(());
    };

    dirs.ensure_exists()?;
    let config = Config::load(&dirs.config_file).unwrap_or_else(|e| {
        warn!("Failed to load config.json, using defaults: {e}");
        Config::default()
    });

    let instance = unsafe { GetModuleHandleW(None) }
        .map(HINSTANCE::from)
        .map_err(std::io::Error::other)?;
    register_host_class(instance).map_err(std::io::Error::other)?;
    overlay::register_class(instance).map_err(std::io::Error::other)?;
    dialogs::register_prompt_class(instance).map_err(std::io::Error::other)?;

    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            HOST_CLASS,
            w!("clickdeck"),
            WS_OVERLAPPED,
            0,
            0,
            0,
            0,
            None,
            None,
            instance,
            None,
        )
    }
    .map_err(std::io::Error::other)?;
    let raw_hwnd = hwnd.0 as isize;

    let dispatcher = Arc::new(ClickDispatcher::new(
        config.hotkey,
        Box::new(WindowSink { hwnd: raw_hwnd }),
    ));
    let _ = CLICKS.set(Arc::clone(&dispatcher));
    let mut hook = MouseHook::new(Arc::clone(&dispatcher));
    hook.install()?;

    let icons = Arc::new(IconCache::new(Box::new(ChainLoader::new(vec![
        Box::new(ImageFileLoader),
        Box::new(ShellIconLoader),
    ]))));

    let autostart = RegistryAutostart::for_current_exe()?;
    if let Err(e) = reconcile(&autostart, config.behavior.launch_on_startup) {
        warn!("Failed to sync start-at-login: {e}");
    }

    let store = JsonItemStore::new(&dirs);
    icons.preload(
        store.load_items(),
        IconSizeCategory::for_icon_size(config.appearance.icon_size),
    );
    let services = PopupServices {
        store: Box::new(store),
        layouts: layout_library(&dirs),
        launcher: Box::new(ShellLauncher),
    };
    let controller = PopupController::new(config, services, Box::new(Win32Host::new(instance)));

    let watcher = match spawn_config_watcher(dirs.config_file.clone(), move || {
        post(raw_hwnd, WM_CONFIG_CHANGED, WPARAM(0), LPARAM(0))
    }) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!("Config hot reload disabled: {e}");
            None
        }
    };
    let tray = match TrayIcon::add(hwnd) {
        Ok(tray) => Some(tray),
        Err(e) => {
            warn!("Tray icon unavailable: {e}");
            None
        }
    };

    APP.with(|slot| {
        *slot.borrow_mut() = Some(App {
            hook,
            controller,
            icons,
            dispatcher,
            autostart,
            dirs,
            _tray: tray,
            _watcher: watcher,
        });
    });
    info!("Ready");

    let mut msg = MSG::default();
    while unsafe { GetMessageW(&mut msg, None, 0, 0) }.0 > 0 {
        unsafe {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    shutdown();
    info!("Exited");
    Ok(())
}

fn register_host_class(instance: HINSTANCE) -> windows::core::Result<()> {
    #[allow(clippy::cast_possible_truncation)] // struct size
    let size = size_of::<WNDCLASSEXW>() as u32;
    let class = WNDCLASSEXW {
        cbSize: size,
        lpfnWndProc: Some(host_proc),
        hInstance: instance,
        lpszClassName: HOST_CLASS,
        ..Default::default()
    };
    if unsafe { RegisterClassExW(&class) } == 0 {
        return Err(windows::core::Error::from_win32());
    }
    Ok(())
}

/// Drop the UI state: closes and persists any open popup, removes the hook
/// and the tray icon. Safe to call more than once.
fn shutdown() {
    let app = APP.with(|slot| slot.try_borrow_mut().ok().and_then(|mut s| s.take()));
    if let Some(app) = app {
        drop(app);
        info!("Shut down");
    }
}

impl App {
    fn autostart_enabled(&self) -> bool {
        self.autostart.is_registered().unwrap_or_else(|e| {
            warn!("Failed to read start-at-login state: {e}");
            self.controller.config().behavior.launch_on_startup
        })
    }

    fn toggle_autostart(&mut self) {
        let wanted = !self.autostart_enabled();
        if let Err(e) = reconcile(&self.autostart, wanted) {
            error!("Failed to change start-at-login: {e}");
            return;
        }

        let mut config = self.controller.config().clone();
        config.behavior.launch_on_startup = wanted;
        if let Err(e) = config.save(&self.dirs.config_file) {
            warn!("Failed to save config.json: {e}");
        }
        self.controller.reload_config(config);
    }

    fn reload_config(&mut self) {
        let config = match Config::load(&self.dirs.config_file) {
            Ok(config) => config,
            Err(e) => {
                warn!("Keeping current settings, config.json is invalid: {e}");
                return;
            }
        };
        let current = self.controller.config();
        if config == *current {
            debug!("Config unchanged");
            return;
        }

        if config.hotkey != current.hotkey {
            self.dispatcher.set_chord(config.hotkey);
            info!("Hotkey changed to {:?}", config.hotkey);
        }
        if config.behavior.launch_on_startup != current.behavior.launch_on_startup
            && let Err(e) = reconcile(&self.autostart, config.behavior.launch_on_startup)
        {
            warn!("Failed to sync start-at-login: {e}");
        }
        self.icons.preload(
            JsonItemStore::new(&self.dirs).load_items(),
            IconSizeCategory::for_icon_size(config.appearance.icon_size),
        );

        self.controller.reload_config(config);
        info!("Config reloaded");
    }
}

fn on_trigger(wparam: WPARAM, lparam: LPARAM) {
    #[allow(clippy::cast_possible_truncation)] // packed by WindowSink
    let at = Point::new(
        f64::from((wparam.0 as u32).cast_signed()),
        f64::from(lparam.0 as i32),
    );
    let shown = with_app(|app| {
        if app.controller.covers(at) {
            debug!("Trigger inside the open popup ignored");
            return Ok(());
        }
        app.controller.show(at)
    });
    match shown {
        Some(Ok(())) => {}
        Some(Err(e)) => error!("Failed to open popup: {e}"),
        None => debug!("Trigger ignored while busy"),
    }
    if let Some(clicks) = CLICKS.get() {
        clicks.complete();
    }
}

fn reload_or_retry(hwnd: HWND) {
    if with_app(App::reload_config).is_none() {
        unsafe {
            SetTimer(hwnd, RELOAD_RETRY_TIMER, RELOAD_RETRY_MS, None);
        }
    }
}

fn tray_menu(hwnd: HWND) {
    let Some(enabled) = with_app(|app| app.autostart_enabled()) else {
        return;
    };
    match tray::show_menu(hwnd, enabled) {
        Some(TrayCommand::ToggleAutostart) => {
            with_app(App::toggle_autostart);
        }
        Some(TrayCommand::Exit) => {
            info!("Exit requested from tray");
            let _ = unsafe { DestroyWindow(hwnd) };
        }
        None => {}
    }
}

unsafe extern "system" fn host_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_TRIGGER => {
            on_trigger(wparam, lparam);
            LRESULT(0)
        }
        WM_CONFIG_CHANGED => {
            reload_or_retry(hwnd);
            LRESULT(0)
        }
        WM_TIMER if wparam.0 == RELOAD_RETRY_TIMER => {
            let _ = unsafe { KillTimer(hwnd, RELOAD_RETRY_TIMER) };
            reload_or_retry(hwnd);
            LRESULT(0)
        }
        WM_TRAY => {
            #[allow(clippy::cast_possible_truncation)] // LOWORD carries the mouse message
            let event = u32::from(lparam.0 as u16);
            if event == WM_RBUTTONUP || event == WM_CONTEXTMENU {
                tray_menu(hwnd);
            }
            LRESULT(0)
        }
        WM_ENDSESSION if wparam.0 != 0 => {
            shutdown();
            LRESULT(0)
        }
        WM_DESTROY => {
            shutdown();
            unsafe { PostQuitMessage(0) };
            LRESULT(0)
        }
        _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}
