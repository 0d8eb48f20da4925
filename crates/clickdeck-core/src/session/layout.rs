//! Bulk repositioning of every item on the canvas.
//!
//! These operations are not individually undoable. Callers clear the
//! position history and persist after running one.

use super::grid::{CanvasBounds, GridMetrics};
use clickdeck_types::{LauncherItem, Point};
use std::cmp::Ordering;

/// Cell sizes closer than this are treated as equal by [`rescale_positions`].
pub const RESCALE_TOLERANCE: f64 = 0.01;

/// Walk items in reading order (by y, then x) into row-major grid cells,
/// wrapping when the next tile would cross the right padding.
pub fn align_to_grid(items: &mut [LauncherItem], bounds: &CanvasBounds) {
    let m = bounds.metrics;
    let cell = m.cell_size();
    let tile = m.tile_extent();
    let right_limit = bounds.canvas.width - m.padding;

    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        let (pa, pb) = (items[a].position(), items[b].position());
        pa.y.total_cmp(&pb.y).then(pa.x.total_cmp(&pb.x))
    });

    let mut x = m.padding;
    let mut y = m.padding;
    for idx in order {
        if x > m.padding && x + tile > right_limit {
            x = m.padding;
            y += cell;
        }
        items[idx].set_position(bounds.clamp(Point::new(x, y)));
        x += cell;
    }
}

/// One column, ordered by display name.
pub fn stack_vertical(items: &mut [LauncherItem], bounds: &CanvasBounds) {
    let m = bounds.metrics;
    stack(items, bounds, |i| Point::new(m.padding, m.padding + i * m.cell_size()));
}

/// One row, ordered by display name.
pub fn stack_horizontal(items: &mut [LauncherItem], bounds: &CanvasBounds) {
    let m = bounds.metrics;
    stack(items, bounds, |i| Point::new(m.padding + i * m.cell_size(), m.padding));
}

fn stack(items: &mut [LauncherItem], bounds: &CanvasBounds, place: impl Fn(f64) -> Point) {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| by_display_name(&items[a], &items[b]));

    for (slot, idx) in order.into_iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let slot = slot as f64;
        items[idx].set_position(bounds.clamp(place(slot)));
    }
}

fn by_display_name(a: &LauncherItem, b: &LauncherItem) -> Ordering {
    a.display_name
        .to_lowercase()
        .cmp(&b.display_name.to_lowercase())
        .then_with(|| a.display_name.cmp(&b.display_name))
}

/// Move each item to its nearest half-cell grid point inside the canvas.
pub fn snap_all_to_grid(items: &mut [LauncherItem], bounds: &CanvasBounds) {
    for item in items.iter_mut() {
        let snapped = bounds.snap(item.position());
        item.set_position(snapped);
    }
}

/// Re-project positions saved under `old` grid metrics onto `new` ones,
/// keeping each item on the same grid cell.
///
/// Returns false, touching nothing, when the cell sizes match. Positions are
/// clamped when `bounds` is known.
pub fn rescale_positions(
    items: &mut [LauncherItem],
    old: &GridMetrics,
    new: &GridMetrics,
    bounds: Option<&CanvasBounds>,
) -> bool {
    let (old_cell, new_cell) = (old.cell_size(), new.cell_size());
    if (old_cell - new_cell).abs() < RESCALE_TOLERANCE || old_cell <= 0.0 {
        return false;
    }

    let project = |v: f64| new.padding + (v - old.padding) / old_cell * new_cell;
    for item in items.iter_mut() {
        let mut p = Point::new(project(item.x), project(item.y));
        if let Some(bounds) = bounds {
            p = bounds.clamp(p);
        }
        item.set_position(p);
    }
    true
}
