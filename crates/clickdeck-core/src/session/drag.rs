use super::grid::CanvasBounds;
use super::history::PositionHistory;
use super::selection::SelectionSet;
use clickdeck_types::{ItemId, LauncherItem, Point};
use tracing::debug;

/// Net displacement below which a finished drag is not recorded.
pub const MOVE_EPSILON: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    /// Button down on an item, threshold not crossed yet
    Pressed,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragUpdate {
    /// No gesture in progress
    Idle,
    BelowThreshold,
    Moved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEnd {
    /// No gesture in progress
    None,
    /// Released before the threshold: treat as a click on this item
    Click(ItemId),
    /// Drag finished; `recorded` operations went into the history
    Dropped { recorded: usize },
}

#[derive(Debug, Clone)]
struct Gesture {
    primary: ItemId,
    start_pointer: Point,
    primary_origin: Point,
    snapshots: Vec<(ItemId, Point)>,
    bounds: CanvasBounds,
    dragging: bool,
}

/// Turns pointer samples into rigid moves of the current selection.
#[derive(Debug, Clone)]
pub struct DragEngine {
    threshold: f64,
    gesture: Option<Gesture>,
}

impl DragEngine {
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.max(0.0),
            gesture: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> DragPhase {
        match &self.gesture {
            None => DragPhase::Idle,
            Some(g) if g.dragging => DragPhase::Dragging,
            Some(_) => DragPhase::Pressed,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.phase() == DragPhase::Dragging
    }

    /// Start a press on `primary` at a canvas-relative pointer position.
    ///
    /// Snapshots the primary item and every selected item. Returns false, and
    /// starts nothing, when the canvas is not realized or the item is unknown.
    pub fn begin(
        &mut self,
        primary: ItemId,
        pointer: Point,
        items: &[LauncherItem],
        selection: &SelectionSet,
        bounds: Option<CanvasBounds>,
    ) -> bool {
        let Some(bounds) = bounds else {
            debug!("Drag ignored: canvas not realized");
            return false;
        };
        let Some(primary_item) = items.iter().find(|item| item.id == primary) else {
            debug!("Drag ignored: item {primary} not found");
            return false;
        };

        let snapshots = items
            .iter()
            .filter(|item| item.id == primary || selection.contains(item.id))
            .map(|item| (item.id, item.position()))
            .collect();

        self.gesture = Some(Gesture {
            primary,
            start_pointer: pointer,
            primary_origin: primary_item.position(),
            snapshots,
            bounds,
            dragging: false,
        });
        true
    }

    /// Feed a pointer sample. Positions in `items` are updated in place.
    pub fn update(&mut self, pointer: Point, snap: bool, items: &mut [LauncherItem]) -> DragUpdate {
        let threshold = self.threshold;
        let Some(gesture) = self.gesture.as_mut() else {
            return DragUpdate::Idle;
        };

        let raw = pointer - gesture.start_pointer;
        if !gesture.dragging {
            if raw.x.abs() <= threshold && raw.y.abs() <= threshold {
                return DragUpdate::BelowThreshold;
            }
            gesture.dragging = true;
        }

        let bounds = gesture.bounds;
        let mut target = gesture.primary_origin + raw;
        if snap {
            target = bounds.snap(target);
        }
        let delta = target - gesture.primary_origin;
        let (lo, hi) = bounds.range(snap);

        let xs: Vec<f64> = gesture.snapshots.iter().map(|(_, p)| p.x).collect();
        let ys: Vec<f64> = gesture.snapshots.iter().map(|(_, p)| p.y).collect();
        let new_xs = rigid_axis(&xs, delta.x, lo.x, hi.x);
        let new_ys = rigid_axis(&ys, delta.y, lo.y, hi.y);

        for (((id, _), x), y) in gesture.snapshots.iter().zip(new_xs).zip(new_ys) {
            if let Some(item) = items.iter_mut().find(|item| item.id == *id) {
                item.set_position(Point::new(x, y));
            }
        }

        DragUpdate::Moved
    }

    /// Finish the gesture, recording one operation per item that moved.
    pub fn end(&mut self, items: &[LauncherItem], history: &mut PositionHistory) -> DragEnd {
        let Some(gesture) = self.gesture.take() else {
            return DragEnd::None;
        };
        if !gesture.dragging {
            return DragEnd::Click(gesture.primary);
        }

        let mut recorded = 0;
        for (id, before) in &gesture.snapshots {
            let Some(item) = items.iter().find(|item| item.id == *id) else {
                continue;
            };
            let after = item.position();
            if (after.x - before.x).abs() > MOVE_EPSILON || (after.y - before.y).abs() > MOVE_EPSILON
            {
                history.record_drag(*id, *before, after);
                recorded += 1;
            }
        }

        DragEnd::Dropped { recorded }
    }

    /// Abandon the gesture without recording, restoring the snapshots.
    /// Returns true if a gesture was in progress.
    pub fn cancel(&mut self, items: &mut [LauncherItem]) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        if gesture.dragging {
            for (id, before) in gesture.snapshots {
                if let Some(item) = items.iter_mut().find(|item| item.id == id) {
                    item.set_position(before);
                }
            }
        }
        true
    }
}

/// Move every coordinate by the same delta, limited so that all stay within
/// `[lo, hi]`. When no single delta satisfies every item, each one is
/// clamped on its own.
fn rigid_axis(origins: &[f64], delta: f64, lo: f64, hi: f64) -> Vec<f64> {
    let min_delta = origins.iter().map(|o| lo - o).fold(f64::NEG_INFINITY, f64::max);
    let max_delta = origins.iter().map(|o| hi - o).fold(f64::INFINITY, f64::min);

    if min_delta <= max_delta {
        let applied = delta.clamp(min_delta, max_delta);
        origins.iter().map(|o| o + applied).collect()
    } else {
        origins.iter().map(|o| (o + delta).clamp(lo, hi)).collect()
    }
}
