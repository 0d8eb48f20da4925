//! Test fixtures and helpers

use crate::config::{Config, WindowGeometry};
use crate::launch::{LaunchRequest, ProcessLauncher};
use crate::popup::{PopupController, PopupHost, PopupServices, PopupSurface};
use crate::store::{LauncherStore, LayoutLibrary, LayoutRepository};
use crate::{Error, Result};
use clickdeck_types::{LauncherItem, NamedLayout, Point, Rect, Size};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Launchable item at a position
pub fn item(name: &str, x: f64, y: f64) -> LauncherItem {
    LauncherItem::new(name, format!("{}.exe", name.to_lowercase())).with_position(x, y)
}

/// Centre of the default 30px tile of an item at `(x, y)`
pub fn tile_center(x: f64, y: f64) -> Point {
    Point::new(x + 15.0, y + 15.0)
}

/// In-memory launcher item store
#[derive(Default)]
pub struct MemoryStore {
    pub items: RefCell<Vec<LauncherItem>>,
    pub saves: Cell<usize>,
    pub geometry: Cell<Option<WindowGeometry>>,
}

impl LauncherStore for Rc<MemoryStore> {
    fn load_items(&self) -> Vec<LauncherItem> {
        self.items.borrow().clone()
    }

    fn save_items(&self, items: &[LauncherItem]) {
        self.saves.set(self.saves.get() + 1);
        *self.items.borrow_mut() = items.to_vec();
    }

    fn save_window_geometry(&self, geometry: WindowGeometry) {
        self.geometry.set(Some(geometry));
    }
}

/// In-memory named layout collection
#[derive(Default)]
pub struct MemoryLayouts {
    pub layouts: RefCell<Vec<NamedLayout>>,
}

impl LayoutRepository for Rc<MemoryLayouts> {
    fn load_all(&self) -> Vec<NamedLayout> {
        self.layouts.borrow().clone()
    }

    fn save_all(&self, layouts: &[NamedLayout]) -> Result<()> {
        *self.layouts.borrow_mut() = layouts.to_vec();
        Ok(())
    }
}

/// Records launches and reveals instead of starting processes
#[derive(Default)]
pub struct RecordingLauncher {
    pub launched: RefCell<Vec<LaunchRequest>>,
    pub revealed: RefCell<Vec<PathBuf>>,
    pub fail: Cell<bool>,
}

impl ProcessLauncher for Rc<RecordingLauncher> {
    fn launch(&self, request: &LaunchRequest) -> Result<()> {
        if self.fail.get() {
            return Err(Error::Launch(format!("{}: access denied", request.executable)));
        }
        self.launched.borrow_mut().push(request.clone());
        Ok(())
    }

    fn reveal(&self, path: &Path) -> Result<()> {
        self.revealed.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

/// Everything the fake windowing layer observed
pub struct HostState {
    pub screen: Rect,
    pub surfaces_created: usize,
    pub live_surfaces: usize,
    pub fail_create: bool,
    /// Whether new surfaces report a canvas size
    pub realized: bool,
    pub last_frame: Option<Rect>,
    pub title: String,
    pub captured: bool,
    pub ticks: Vec<u64>,
    pub confirm_answer: bool,
    pub confirms: Vec<String>,
    pub prompt_answer: Option<String>,
    pub picked_files: Vec<PathBuf>,
    pub shortcuts: HashMap<PathBuf, PathBuf>,
    /// What the properties editor returns; `None` cancels it
    pub edit_answer: Option<LauncherItem>,
    pub errors: Vec<String>,
}

impl Default for HostState {
    fn default() -> Self {
        Self {
            screen: Rect::new(0.0, 0.0, 1920.0, 1080.0),
            surfaces_created: 0,
            live_surfaces: 0,
            fail_create: false,
            realized: true,
            last_frame: None,
            title: String::new(),
            captured: false,
            ticks: Vec::new(),
            confirm_answer: true,
            confirms: Vec::new(),
            prompt_answer: None,
            picked_files: Vec::new(),
            shortcuts: HashMap::new(),
            edit_answer: None,
            errors: Vec::new(),
        }
    }
}

pub struct FakeHost {
    state: Rc<RefCell<HostState>>,
}

impl FakeHost {
    pub fn new(state: Rc<RefCell<HostState>>) -> Self {
        Self { state }
    }
}

impl PopupHost for FakeHost {
    fn create_surface(&mut self, frame: Rect) -> Result<Box<dyn PopupSurface>> {
        let mut state = self.state.borrow_mut();
        if state.fail_create {
            return Err(Error::Surface("CreateWindowEx failed".to_string()));
        }
        state.surfaces_created += 1;
        state.live_surfaces += 1;
        state.last_frame = Some(frame);
        Ok(Box::new(FakeSurface {
            state: Rc::clone(&self.state),
            frame,
            realized: state.realized,
            closed: false,
        }))
    }

    fn virtual_screen(&self) -> Rect {
        self.state.borrow().screen
    }

    fn confirm(&mut self, _title: &str, message: &str) -> bool {
        let mut state = self.state.borrow_mut();
        state.confirms.push(message.to_string());
        state.confirm_answer
    }

    fn prompt_text(&mut self, _title: &str, _initial: &str) -> Option<String> {
        self.state.borrow().prompt_answer.clone()
    }

    fn pick_files(&mut self, _title: &str) -> Vec<PathBuf> {
        std::mem::take(&mut self.state.borrow_mut().picked_files)
    }

    fn resolve_shortcut(&self, path: &Path) -> Option<PathBuf> {
        self.state.borrow().shortcuts.get(path).cloned()
    }

    fn edit_item(&mut self, _item: &LauncherItem) -> Option<LauncherItem> {
        self.state.borrow().edit_answer.clone()
    }

    fn report_error(&mut self, _title: &str, message: &str) {
        self.state.borrow_mut().errors.push(message.to_string());
    }
}

pub struct FakeSurface {
    state: Rc<RefCell<HostState>>,
    frame: Rect,
    realized: bool,
    closed: bool,
}

impl PopupSurface for FakeSurface {
    fn show(&mut self) {}

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state.borrow_mut().live_surfaces -= 1;
        }
    }

    fn invalidate(&mut self) {}

    fn canvas_size(&self) -> Option<Size> {
        self.realized.then(|| self.frame.size())
    }

    fn set_capture(&mut self, captured: bool) {
        self.state.borrow_mut().captured = captured;
    }

    fn set_size(&mut self, size: Size) {
        self.frame.width = size.width;
        self.frame.height = size.height;
    }

    fn frame(&self) -> Rect {
        self.frame
    }

    fn schedule_tick(&mut self, delay_ms: u64) {
        self.state.borrow_mut().ticks.push(delay_ms);
    }

    fn set_title(&mut self, title: &str) {
        self.state.borrow_mut().title = title.to_string();
    }
}

/// A controller wired to in-memory collaborators
pub struct Harness {
    pub controller: PopupController,
    pub store: Rc<MemoryStore>,
    pub layouts: Rc<MemoryLayouts>,
    pub launcher: Rc<RecordingLauncher>,
    pub host: Rc<RefCell<HostState>>,
}

impl Harness {
    pub fn new(items: Vec<LauncherItem>) -> Self {
        Self::with_config(Config::default(), items)
    }

    pub fn with_config(config: Config, items: Vec<LauncherItem>) -> Self {
        let store = Rc::new(MemoryStore::default());
        *store.items.borrow_mut() = items;
        let layouts = Rc::new(MemoryLayouts::default());
        let launcher = Rc::new(RecordingLauncher::default());
        let host = Rc::new(RefCell::new(HostState::default()));

        let services = PopupServices {
            store: Box::new(Rc::clone(&store)),
            layouts: LayoutLibrary::new(Box::new(Rc::clone(&layouts))),
            launcher: Box::new(Rc::clone(&launcher)),
        };
        let controller = PopupController::new(
            config,
            services,
            Box::new(FakeHost::new(Rc::clone(&host))),
        );

        Self {
            controller,
            store,
            layouts,
            launcher,
            host,
        }
    }

    /// Open the popup at a fixed cursor position
    pub fn open(&mut self) {
        self.controller.show(Point::new(100.0, 100.0)).unwrap();
    }

    pub fn item_position(&self, index: usize) -> Point {
        self.controller.items().unwrap()[index].position()
    }

    pub fn launched(&self) -> usize {
        self.launcher.launched.borrow().len()
    }
}
