//! Shared types for clickdeck components.
//!
//! This crate provides the plain data used across clickdeck-core and the
//! clickdeck daemon: launcher items, named layouts, geometry primitives and
//! keyboard-modifier state. Persisted types serialize as camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

/// Executable path sentinel for a placeholder item that launches nothing.
pub const NO_ACTION: &str = "NO_ACTION";

/// Icon size used when a saved layout carries no (or a non-positive) icon size.
pub const DEFAULT_ICON_SIZE: f64 = 20.0;

/// Icon spacing used when a saved layout carries no (or a negative) spacing.
pub const DEFAULT_ICON_SPACING: f64 = 10.0;

/// Stable identifier of a launcher item. Assigned once, never reassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A point (or displacement) in canvas or screen units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub const fn square(side: f64) -> Self {
        Self {
            width: side,
            height: side,
        }
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Half-open containment: the right and bottom edges are outside.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }
}

/// Live down/up state of the four modifier keys (left and right variants OR'd).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierState {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub win: bool,
}

impl ModifierState {
    pub const NONE: ModifierState = ModifierState {
        ctrl: false,
        alt: false,
        shift: false,
        win: false,
    };

    #[must_use]
    pub const fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    #[must_use]
    pub const fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    #[must_use]
    pub fn any(&self) -> bool {
        self.ctrl || self.alt || self.shift || self.win
    }
}

/// Activation chord: which modifiers must be down (and, implicitly, which must be up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotkeyChord {
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub win: bool,
}

impl Default for HotkeyChord {
    fn default() -> Self {
        Self {
            ctrl: true,
            alt: false,
            shift: false,
            win: false,
        }
    }
}

impl HotkeyChord {
    const CTRL_BIT: u8 = 0b0001;
    const ALT_BIT: u8 = 0b0010;
    const SHIFT_BIT: u8 = 0b0100;
    const WIN_BIT: u8 = 0b1000;

    #[must_use]
    pub const fn new(ctrl: bool, alt: bool, shift: bool, win: bool) -> Self {
        Self {
            ctrl,
            alt,
            shift,
            win,
        }
    }

    /// True when no modifier is required. Such a chord never activates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.ctrl || self.alt || self.shift || self.win)
    }

    /// Pack into four bits so the chord can live in an atomic.
    #[must_use]
    pub fn to_bits(self) -> u8 {
        let mut bits = 0;
        if self.ctrl {
            bits |= Self::CTRL_BIT;
        }
        if self.alt {
            bits |= Self::ALT_BIT;
        }
        if self.shift {
            bits |= Self::SHIFT_BIT;
        }
        if self.win {
            bits |= Self::WIN_BIT;
        }
        bits
    }

    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        Self {
            ctrl: bits & Self::CTRL_BIT != 0,
            alt: bits & Self::ALT_BIT != 0,
            shift: bits & Self::SHIFT_BIT != 0,
            win: bits & Self::WIN_BIT != 0,
        }
    }
}

impl fmt::Display for HotkeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [
            (self.ctrl, "Ctrl"),
            (self.alt, "Alt"),
            (self.shift, "Shift"),
            (self.win, "Win"),
        ]
        .iter()
        .filter_map(|&(on, name)| on.then_some(name))
        .collect();

        if parts.is_empty() {
            write!(f, "(none)")
        } else {
            write!(f, "{}+Right-click", parts.join("+"))
        }
    }
}

/// Icon size bucket requested from the icon cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconSizeCategory {
    Small,
    Large,
}

impl IconSizeCategory {
    /// Nominal pixel edge for the bucket.
    #[must_use]
    pub fn pixels(self) -> u32 {
        match self {
            IconSizeCategory::Small => 16,
            IconSizeCategory::Large => 32,
        }
    }

    /// Bucket that best fits an on-screen icon size.
    #[must_use]
    pub fn for_icon_size(icon_size: f64) -> Self {
        if icon_size > 24.0 {
            IconSizeCategory::Large
        } else {
            IconSizeCategory::Small
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IconSizeCategory::Small => "small",
            IconSizeCategory::Large => "large",
        }
    }
}

fn default_display_name() -> String {
    "New Application".to_string()
}

/// One launcher entry placed on the popup canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LauncherItem {
    #[serde(default)]
    pub id: ItemId,

    #[serde(default = "default_display_name")]
    pub display_name: String,

    /// May hold [`NO_ACTION`] for a placeholder entry
    #[serde(default)]
    pub executable_path: String,

    #[serde(default)]
    pub arguments: String,

    /// Falls back to `executable_path` when empty
    #[serde(default)]
    pub icon_path: String,

    #[serde(default)]
    pub working_directory: String,

    #[serde(default)]
    pub x: f64,

    #[serde(default)]
    pub y: f64,

    /// Transient UI flag, never persisted
    #[serde(skip)]
    pub is_selected: bool,
}

impl Default for LauncherItem {
    fn default() -> Self {
        Self {
            id: ItemId::new(),
            display_name: default_display_name(),
            executable_path: String::new(),
            arguments: String::new(),
            icon_path: String::new(),
            working_directory: String::new(),
            x: 10.0,
            y: 10.0,
            is_selected: false,
        }
    }
}

impl LauncherItem {
    #[must_use]
    pub fn new(display_name: impl Into<String>, executable_path: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            executable_path: executable_path.into(),
            ..Default::default()
        }
    }

    /// Build an item for a file picked by the user: the display name is the
    /// file stem and the file itself doubles as the icon source.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let display_name = path
            .file_stem()
            .map_or_else(default_display_name, |s| s.to_string_lossy().into_owned());
        let path_str = path.to_string_lossy().into_owned();
        Self {
            display_name,
            icon_path: path_str.clone(),
            executable_path: path_str,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// True for the `NO_ACTION` placeholder entry.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.executable_path == NO_ACTION
    }

    /// Path the icon should be resolved from: custom icon first, executable second.
    #[must_use]
    pub fn icon_source(&self) -> Option<&str> {
        [self.icon_path.as_str(), self.executable_path.as_str()]
            .into_iter()
            .find(|p| !p.trim().is_empty())
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, p: Point) {
        self.x = p.x;
        self.y = p.y;
    }

    /// Replace non-finite coordinates with the origin.
    pub fn sanitize_position(&mut self) {
        if !self.x.is_finite() {
            self.x = 0.0;
        }
        if !self.y.is_finite() {
            self.y = 0.0;
        }
    }
}

fn default_icon_size() -> f64 {
    DEFAULT_ICON_SIZE
}

fn default_icon_spacing() -> f64 {
    DEFAULT_ICON_SPACING
}

/// A saved snapshot of the launcher canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedLayout {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    pub name: String,

    /// JSON array of [`LauncherItem`] captured at save time
    #[serde(alias = "layoutJson")]
    pub serialized_items: String,

    #[serde(default = "Utc::now", alias = "savedDate")]
    pub saved_at: DateTime<Utc>,

    #[serde(default)]
    pub window_width: f64,

    #[serde(default)]
    pub window_height: f64,

    #[serde(default = "default_icon_size")]
    pub icon_size: f64,

    #[serde(default = "default_icon_spacing")]
    pub icon_spacing: f64,
}

impl NamedLayout {
    /// Snapshot `items` under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the items cannot be serialized.
    pub fn capture(
        name: impl Into<String>,
        items: &[LauncherItem],
        window: Size,
        icon_size: f64,
        icon_spacing: f64,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            serialized_items: serde_json::to_string(items)?,
            saved_at: Utc::now(),
            window_width: window.width,
            window_height: window.height,
            icon_size,
            icon_spacing,
        })
    }

    /// Decode the captured items.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored blob is not a valid item list.
    pub fn items(&self) -> Result<Vec<LauncherItem>, serde_json::Error> {
        if self.serialized_items.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&self.serialized_items)
    }

    /// Number of captured items, 0 when the blob is unreadable.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items().map_or(0, |items| items.len())
    }

    /// Apply the defaults older saved files need: size <= 0 becomes 20, spacing < 0 becomes 10.
    #[must_use]
    pub fn with_backfilled_defaults(mut self) -> Self {
        if !(self.icon_size.is_finite() && self.icon_size > 0.0) {
            self.icon_size = DEFAULT_ICON_SIZE;
        }
        if !(self.icon_spacing.is_finite() && self.icon_spacing >= 0.0) {
            self.icon_spacing = DEFAULT_ICON_SPACING;
        }
        self
    }

    #[must_use]
    pub fn window_size(&self) -> Size {
        Size::new(self.window_width, self.window_height)
    }

    /// "360x260" style summary of the saved window size.
    #[must_use]
    pub fn window_size_display(&self) -> String {
        format!("{:.0}x{:.0}", self.window_width, self.window_height)
    }

    /// "20px / 10px" style summary of the saved icon settings.
    #[must_use]
    pub fn icon_settings_display(&self) -> String {
        format!("{:.0}px / {:.0}px", self.icon_size, self.icon_spacing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_launcher_item_default() {
        let item = LauncherItem::default();
        assert_eq!(item.display_name, "New Application");
        assert!(item.executable_path.is_empty());
        assert_eq!(item.position(), Point::new(10.0, 10.0));
        assert!(!item.is_selected);
    }

    #[test]
    fn test_launcher_item_ids_unique() {
        let a = LauncherItem::default();
        let b = LauncherItem::default();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_launcher_item_serializes_camel_case_without_selection() {
        let mut item = LauncherItem::new("Notepad", r"C:\Windows\notepad.exe");
        item.is_selected = true;
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(value["displayName"], "Notepad");
        assert_eq!(value["executablePath"], r"C:\Windows\notepad.exe");
        assert!(value.get("isSelected").is_none());
        assert!(value.get("workingDirectory").is_some());
    }

    #[test]
    fn test_launcher_item_deserialize_minimal() {
        let json = json!({
            "id": "6f1c1f7e-8a3b-4c3e-9a55-0a4b7d7c9e01",
            "executablePath": "calc.exe"
        });
        let item: LauncherItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.display_name, "New Application");
        assert_eq!(item.executable_path, "calc.exe");
        assert_eq!(item.x, 0.0);
        assert!(!item.is_selected);
        assert_eq!(
            item.id.to_string(),
            "6f1c1f7e-8a3b-4c3e-9a55-0a4b7d7c9e01"
        );
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(LauncherItem::new("Nothing", NO_ACTION).is_placeholder());
        assert!(!LauncherItem::new("Calc", "calc.exe").is_placeholder());
    }

    #[test]
    fn test_icon_source_prefers_custom_icon() {
        let mut item = LauncherItem::new("Calc", "calc.exe");
        assert_eq!(item.icon_source(), Some("calc.exe"));

        item.icon_path = "calc.png".to_string();
        assert_eq!(item.icon_source(), Some("calc.png"));

        item.icon_path = "   ".to_string();
        item.executable_path = String::new();
        assert_eq!(item.icon_source(), None);
    }

    #[test]
    fn test_from_path_uses_file_stem() {
        let item = LauncherItem::from_path(Path::new("/opt/tools/editor.exe"));
        assert_eq!(item.display_name, "editor");
        assert_eq!(item.executable_path, "/opt/tools/editor.exe");
        assert_eq!(item.icon_path, item.executable_path);
    }

    #[test]
    fn test_sanitize_position() {
        let mut item = LauncherItem::default().with_position(f64::NAN, f64::INFINITY);
        item.sanitize_position();
        assert_eq!(item.position(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_rect_contains_is_half_open() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(29.9, 29.9)));
        assert!(!r.contains(Point::new(30.0, 15.0)));
        assert!(!r.contains(Point::new(9.9, 15.0)));
    }

    #[test]
    fn test_point_arithmetic() {
        let a = Point::new(5.0, 7.0);
        let b = Point::new(2.0, 3.0);
        assert_eq!(a - b, Point::new(3.0, 4.0));
        assert_eq!(a + b, Point::new(7.0, 10.0));
    }

    #[test]
    fn test_hotkey_chord_default_is_ctrl() {
        let chord = HotkeyChord::default();
        assert!(chord.ctrl && !chord.alt && !chord.shift && !chord.win);
        assert!(!chord.is_empty());
    }

    #[test]
    fn test_hotkey_chord_display() {
        assert_eq!(
            HotkeyChord::new(true, false, true, false).to_string(),
            "Ctrl+Shift+Right-click"
        );
        assert_eq!(HotkeyChord::new(false, false, false, false).to_string(), "(none)");
    }

    #[test]
    fn test_hotkey_chord_deserialize_missing_flags() {
        let chord: HotkeyChord = serde_json::from_value(json!({"alt": true})).unwrap();
        assert_eq!(chord, HotkeyChord::new(false, true, false, false));
    }

    #[test]
    fn test_icon_size_category() {
        assert_eq!(IconSizeCategory::Small.pixels(), 16);
        assert_eq!(IconSizeCategory::Large.pixels(), 32);
        assert_eq!(IconSizeCategory::for_icon_size(20.0), IconSizeCategory::Small);
        assert_eq!(IconSizeCategory::for_icon_size(40.0), IconSizeCategory::Large);
    }

    #[test]
    fn test_named_layout_capture_and_items() {
        let items = vec![
            LauncherItem::new("A", "a.exe").with_position(10.0, 10.0),
            LauncherItem::new("B", "b.exe").with_position(50.0, 10.0),
        ];
        let layout =
            NamedLayout::capture("Work", &items, Size::new(360.0, 260.0), 20.0, 10.0).unwrap();

        assert_eq!(layout.name, "Work");
        assert_eq!(layout.item_count(), 2);
        let decoded = layout.items().unwrap();
        assert_eq!(decoded[1].display_name, "B");
        assert_eq!(decoded[1].x, 50.0);
        assert_eq!(layout.window_size_display(), "360x260");
        assert_eq!(layout.icon_settings_display(), "20px / 10px");
    }

    #[test]
    fn test_named_layout_legacy_fields_and_defaults() {
        let json = json!({
            "name": "Old",
            "layoutJson": "[]",
            "savedDate": "2024-03-01T12:00:00Z",
            "windowWidth": 300.0,
            "windowHeight": 200.0
        });
        let layout: NamedLayout = serde_json::from_value(json).unwrap();
        assert_eq!(layout.icon_size, DEFAULT_ICON_SIZE);
        assert_eq!(layout.icon_spacing, DEFAULT_ICON_SPACING);
        assert_eq!(layout.item_count(), 0);
        assert_eq!(layout.saved_at.to_rfc3339(), "2024-03-01T12:00:00+00:00");
    }

    #[test]
    fn test_named_layout_backfills_invalid_icon_settings() {
        let mut layout = NamedLayout::capture("X", &[], Size::default(), 0.0, -4.0).unwrap();
        layout = layout.with_backfilled_defaults();
        assert_eq!(layout.icon_size, 20.0);
        assert_eq!(layout.icon_spacing, 10.0);

        let kept = NamedLayout::capture("Y", &[], Size::default(), 32.0, 0.0)
            .unwrap()
            .with_backfilled_defaults();
        assert_eq!(kept.icon_size, 32.0);
        assert_eq!(kept.icon_spacing, 0.0);
    }

    #[test]
    fn test_named_layout_corrupt_blob_counts_zero() {
        let mut layout = NamedLayout::capture("X", &[], Size::default(), 20.0, 10.0).unwrap();
        layout.serialized_items = "{not json".to_string();
        assert!(layout.items().is_err());
        assert_eq!(layout.item_count(), 0);
    }
}
