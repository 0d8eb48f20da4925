use super::PopupController;
use clickdeck_types::{IconSizeCategory, LauncherItem, Rect};

/// Window title when no item is hovered.
pub const DEFAULT_TITLE: &str = "clickdeck";

/// One item as it should be painted.
#[derive(Debug, Clone, PartialEq)]
pub struct TileView {
    pub item: LauncherItem,
    /// Canvas-relative tile rectangle, icon chrome included
    pub bounds: Rect,
    pub selected: bool,
    pub hovered: bool,
}

/// Snapshot of the open popup for painting.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupView {
    /// Paint order; later tiles are on top
    pub tiles: Vec<TileView>,
    /// No launchable items: show the "no items" state instead of tiles
    pub placeholder: bool,
    pub icon_size: f64,
    pub icon_category: IconSizeCategory,
}

impl PopupController {
    #[must_use]
    pub fn view(&self) -> Option<PopupView> {
        let session = self.session.as_ref()?;
        let metrics = self.config.grid_metrics();
        let tile = metrics.tile_size();

        let placeholder = session.items.iter().all(LauncherItem::is_placeholder);
        let tiles = if placeholder {
            Vec::new()
        } else {
            session
                .items
                .iter()
                .map(|item| TileView {
                    item: item.clone(),
                    bounds: Rect::from_origin_size(item.position(), tile),
                    selected: item.is_selected,
                    hovered: session.hovered == Some(item.id),
                })
                .collect()
        };

        Some(PopupView {
            tiles,
            placeholder,
            icon_size: metrics.icon_size,
            icon_category: IconSizeCategory::for_icon_size(metrics.icon_size),
        })
    }
}
