use crate::Result;
use crate::session::GridMetrics;
use clickdeck_types::{DEFAULT_ICON_SIZE, DEFAULT_ICON_SPACING, HotkeyChord, Size};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub hotkey: HotkeyChord,

    #[serde(default)]
    pub appearance: AppearanceConfig,

    #[serde(default)]
    pub behavior: BehaviorConfig,

    #[serde(default)]
    pub window: WindowGeometry,
}

impl Config {
    /// Load config from file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        super::validation::warn_unknown_fields(&content, "config.json");
        let config: Self = serde_json::from_str(&content)?;
        Ok(config.sanitized())
    }

    /// Save config to file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        crate::utils::atomic_write(path, &content)?;
        Ok(())
    }

    /// Replace out-of-range values with their defaults.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let appearance = &mut self.appearance;
        if !(appearance.icon_size.is_finite() && appearance.icon_size > 0.0) {
            appearance.icon_size = default_icon_size();
        }
        if !(appearance.icon_spacing.is_finite() && appearance.icon_spacing >= 0.0) {
            appearance.icon_spacing = default_icon_spacing();
        }
        if !(appearance.canvas_padding.is_finite() && appearance.canvas_padding >= 0.0) {
            appearance.canvas_padding = default_canvas_padding();
        }

        let behavior = &mut self.behavior;
        if behavior.double_click_ms == 0 {
            behavior.double_click_ms = default_double_click_ms();
        }
        if !(behavior.drag_threshold.is_finite() && behavior.drag_threshold >= 0.0) {
            behavior.drag_threshold = default_drag_threshold();
        }
        if behavior.history_limit == 0 {
            behavior.history_limit = default_history_limit();
        }

        let window = &mut self.window;
        if !(window.width.is_finite() && window.width >= MIN_WINDOW_EXTENT) {
            window.width = default_window_width();
        }
        if !(window.height.is_finite() && window.height >= MIN_WINDOW_EXTENT) {
            window.height = default_window_height();
        }
        if !window.last_x.is_finite() {
            window.last_x = 0.0;
        }
        if !window.last_y.is_finite() {
            window.last_y = 0.0;
        }

        self
    }

    /// Grid geometry derived from the appearance settings.
    #[must_use]
    pub fn grid_metrics(&self) -> GridMetrics {
        GridMetrics::new(
            self.appearance.icon_size,
            self.appearance.icon_spacing,
            self.appearance.canvas_padding,
        )
    }
}

const MIN_WINDOW_EXTENT: f64 = 80.0;

/// Icon rendering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceConfig {
    #[serde(default = "default_icon_size")]
    pub icon_size: f64,

    #[serde(default = "default_icon_spacing")]
    pub icon_spacing: f64,

    /// Inset of the snap grid origin from the canvas edge
    #[serde(default = "default_canvas_padding")]
    pub canvas_padding: f64,
}

fn default_icon_size() -> f64 {
    DEFAULT_ICON_SIZE
}
fn default_icon_spacing() -> f64 {
    DEFAULT_ICON_SPACING
}
fn default_canvas_padding() -> f64 {
    10.0
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            icon_size: default_icon_size(),
            icon_spacing: default_icon_spacing(),
            canvas_padding: default_canvas_padding(),
        }
    }
}

/// Interaction tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorConfig {
    #[serde(default = "default_double_click_ms")]
    pub double_click_ms: u64,

    /// Pointer travel (px) before a press becomes a drag
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold: f64,

    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default)]
    pub launch_on_startup: bool,

    #[serde(default = "default_true")]
    pub close_on_launch: bool,
}

fn default_double_click_ms() -> u64 {
    250
}
fn default_drag_threshold() -> f64 {
    4.0
}
fn default_history_limit() -> usize {
    100
}
fn default_true() -> bool {
    true
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            double_click_ms: default_double_click_ms(),
            drag_threshold: default_drag_threshold(),
            history_limit: default_history_limit(),
            launch_on_startup: false,
            close_on_launch: true,
        }
    }
}

/// Last popup window geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowGeometry {
    #[serde(default = "default_window_width")]
    pub width: f64,

    #[serde(default = "default_window_height")]
    pub height: f64,

    #[serde(default)]
    pub last_x: f64,

    #[serde(default)]
    pub last_y: f64,
}

fn default_window_width() -> f64 {
    360.0
}
fn default_window_height() -> f64 {
    260.0
}

impl WindowGeometry {
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
            last_x: 0.0,
            last_y: 0.0,
        }
    }
}
