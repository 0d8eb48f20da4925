//! The popup session: one transient overlay per trigger.
//!
//! `PopupController` lives on the UI thread for the whole process. Each
//! `show` builds a fresh session (items, selection, history, drag state)
//! against a new surface; `close` persists it and drops it. At most one
//! session exists at a time.

mod actions;
mod gestures;
mod host;
mod view;

pub use actions::{BackgroundAction, ContextMenu, ItemAction, Key};
pub use host::{PopupHost, PopupSurface, place_frame};
pub use view::{DEFAULT_TITLE, PopupView, TileView};

use crate::Result;
use crate::config::{Config, WindowGeometry};
use crate::input::DoubleClickTracker;
use crate::launch::ProcessLauncher;
use crate::session::{CanvasBounds, DragEngine, PositionHistory, SelectionSet};
use crate::store::{LauncherStore, LayoutLibrary};
use clickdeck_types::{ItemId, LauncherItem, Point, Rect, Size};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupPhase {
    Closed,
    Opening,
    Open,
    Closing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Deactivated,
    Escape,
    Requested,
    Launched,
    /// A new trigger arrived while this popup was open
    Replaced,
    Shutdown,
}

/// Collaborators the popup persists and launches through.
pub struct PopupServices {
    pub store: Box<dyn LauncherStore>,
    pub layouts: LayoutLibrary,
    pub launcher: Box<dyn ProcessLauncher>,
}

#[derive(Debug, Clone, Copy)]
struct PendingLaunch {
    id: ItemId,
    due_ms: u64,
}

/// Everything owned by one open popup.
struct Session {
    surface: Box<dyn PopupSurface>,
    items: Vec<LauncherItem>,
    selection: SelectionSet,
    history: PositionHistory,
    drag: DragEngine,
    clicks: DoubleClickTracker,
    /// Single click waiting out the double-click window
    pending_launch: Option<PendingLaunch>,
    /// The current press was a Ctrl toggle, not a click
    press_toggled: bool,
    hovered: Option<ItemId>,
    modal_depth: u32,
    context_menu_open: bool,
}

impl Session {
    fn new(surface: Box<dyn PopupSurface>, mut items: Vec<LauncherItem>, config: &Config) -> Self {
        for item in &mut items {
            item.is_selected = false;
        }
        Self {
            surface,
            items,
            selection: SelectionSet::new(),
            history: PositionHistory::new(config.behavior.history_limit),
            drag: DragEngine::new(config.behavior.drag_threshold),
            clicks: DoubleClickTracker::new(config.behavior.double_click_ms),
            pending_launch: None,
            press_toggled: false,
            hovered: None,
            modal_depth: 0,
            context_menu_open: false,
        }
    }

    /// Topmost item under `pos`; later items paint over earlier ones.
    fn hit_test(&self, pos: Point, tile: Size) -> Option<ItemId> {
        self.items
            .iter()
            .rev()
            .find(|item| Rect::from_origin_size(item.position(), tile).contains(pos))
            .map(|item| item.id)
    }

    fn item(&self, id: ItemId) -> Option<&LauncherItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn is_busy(&self) -> bool {
        self.modal_depth > 0 || self.context_menu_open || self.drag.is_active()
    }
}

pub struct PopupController {
    config: Config,
    services: PopupServices,
    host: Box<dyn PopupHost>,
    phase: PopupPhase,
    session: Option<Session>,
}

impl PopupController {
    pub fn new(config: Config, services: PopupServices, host: Box<dyn PopupHost>) -> Self {
        Self {
            config,
            services,
            host,
            phase: PopupPhase::Closed,
            session: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Swap the configuration context. An open popup keeps its session;
    /// the next one picks the new values up.
    pub fn reload_config(&mut self, config: Config) {
        debug!("Popup config reloaded");
        self.config = config;
    }

    #[must_use]
    pub fn phase(&self) -> PopupPhase {
        self.phase
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Working copy of the open popup's items.
    #[must_use]
    pub fn items(&self) -> Option<&[LauncherItem]> {
        self.session.as_ref().map(|s| s.items.as_slice())
    }

    #[must_use]
    pub fn selection(&self) -> Option<&SelectionSet> {
        self.session.as_ref().map(|s| &s.selection)
    }

    #[must_use]
    pub fn history(&self) -> Option<&PositionHistory> {
        self.session.as_ref().map(|s| &s.history)
    }

    pub fn layouts(&self) -> &LayoutLibrary {
        &self.services.layouts
    }

    /// Whether the open popup's window frame covers the screen point `at`.
    #[must_use]
    pub fn covers(&self, at: Point) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.surface.frame().contains(at))
    }

    /// Open a popup with its top-left at `cursor`, closing any open one first.
    ///
    /// # Errors
    ///
    /// Returns the host's error when the surface cannot be created; the
    /// controller is then back in `Closed`.
    pub fn show(&mut self, cursor: Point) -> Result<()> {
        if self.session.is_some() {
            self.close(CloseReason::Replaced);
        }

        self.phase = PopupPhase::Opening;
        let items = self.services.store.load_items();
        let frame = place_frame(cursor, self.config.window.size(), self.host.virtual_screen());
        let surface = match self.host.create_surface(frame) {
            Ok(surface) => surface,
            Err(e) => {
                self.phase = PopupPhase::Closed;
                return Err(e);
            }
        };

        let count = items.len();
        let session = self.session.insert(Session::new(surface, items, &self.config));
        session.surface.set_title(DEFAULT_TITLE);
        session.surface.show();
        session.surface.invalidate();
        self.phase = PopupPhase::Open;
        info!("Popup opened at ({:.0}, {:.0}) with {count} items", frame.x, frame.y);
        Ok(())
    }

    /// Persist and destroy the open popup. Returns false when none is open.
    ///
    /// A drag in progress is reverted, not recorded.
    pub fn close(&mut self, reason: CloseReason) -> bool {
        let Some(mut session) = self.session.take() else {
            return false;
        };
        self.phase = PopupPhase::Closing;

        if session.drag.cancel(&mut session.items) {
            session.surface.set_capture(false);
            debug!("Drag discarded by close");
        }
        session.selection.deselect_all(&mut session.items, None);
        self.services.store.save_items(&session.items);

        let frame = session.surface.frame();
        let geometry = WindowGeometry {
            width: frame.width,
            height: frame.height,
            last_x: frame.x,
            last_y: frame.y,
        };
        self.services.store.save_window_geometry(geometry);
        self.config.window = geometry;

        session.surface.close();
        self.phase = PopupPhase::Closed;
        info!("Popup closed ({reason:?})");
        true
    }

    /// The popup lost activation. Closes it unless a dialog, context menu or
    /// drag is in progress. Returns true if it closed.
    pub fn deactivated(&mut self) -> bool {
        match &self.session {
            None => false,
            Some(session) if session.is_busy() => {
                debug!("Deactivation ignored: popup busy");
                false
            }
            Some(_) => self.close(CloseReason::Deactivated),
        }
    }

    /// Mark the start of a modal child owned by the host.
    pub fn begin_modal(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.modal_depth += 1;
        }
    }

    pub fn end_modal(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.modal_depth = session.modal_depth.saturating_sub(1);
        }
    }

    pub fn set_context_menu_open(&mut self, open: bool) {
        if let Some(session) = self.session.as_mut() {
            session.context_menu_open = open;
        }
    }

    fn with_modal<T>(&mut self, f: impl FnOnce(&mut dyn PopupHost) -> T) -> T {
        self.begin_modal();
        let out = f(self.host.as_mut());
        self.end_modal();
        out
    }

    /// Canvas geometry of the open popup, `None` until it is realized.
    fn bounds(&self) -> Option<CanvasBounds> {
        let size = self.session.as_ref()?.surface.canvas_size()?;
        Some(CanvasBounds::new(size, self.config.grid_metrics()))
    }

    fn tile_size(&self) -> Size {
        self.config.grid_metrics().tile_size()
    }
}

impl Drop for PopupController {
    fn drop(&mut self) {
        self.close(CloseReason::Shutdown);
    }
}
